use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlantDoctorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("解析できるファイルがありません: {0}")]
    NoFilesFound(String),

    #[error("診断エラー: {0}")]
    Diagnosis(#[from] plant_doctor_common::Error),

    #[error("HTTPクライアント初期化エラー: {0}")]
    HttpClient(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlantDoctorError>;
