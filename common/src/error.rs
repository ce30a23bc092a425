//! エラー型定義
//!
//! 診断フローのエラーは3系統に分かれる:
//! - Validation: アップロード前のクライアント側チェック（ネットワークには到達しない）
//! - Network / Timeout: 通信失敗・タイムアウト
//! - Service: サービスが明示的に失敗を返した

use thiserror::Error;

/// ユーザーに表示する汎用メッセージ（他に手掛かりが無い場合）
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// アップロード検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes, max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Only one file can be analysed at a time ({0} given)")]
    TooManyFiles(usize),

    #[error("No file selected")]
    NoFile,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// サービス側メッセージはそのまま表示する
    #[error("{0}")]
    Service(String),

    #[error("An analysis is already in progress")]
    Busy,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 通信系のエラーか（タイムアウトを含む）
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// 画面に出すメッセージ
    ///
    /// サービスの詳細メッセージ → エラー自身のメッセージ → 汎用メッセージ の順で決める
    pub fn user_message(&self) -> String {
        let message = match self {
            Error::Service(detail) => detail.trim().to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
