use crate::error::{PlantDoctorError, Result};
use plant_doctor_common::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 接続先を上書きする環境変数
pub const API_BASE_ENV: &str = "PLANT_DOCTOR_API_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// 診断サービスのベースURL（未設定なら既定値）
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PlantDoctorError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("plant-doctor").join("config.json"))
    }

    /// 起動時に1回だけ解決する接続先
    ///
    /// 優先順位: 環境変数 → 設定ファイル → 既定値
    pub fn api_base(&self) -> String {
        resolve_api_base(std::env::var(API_BASE_ENV).ok(), self.api_base.as_deref())
    }

    pub fn set_api_base(&mut self, url: String) -> Result<()> {
        self.api_base = Some(validate_api_base(&url)?);
        self.save()
    }
}

/// 接続先を決める（空文字は未設定扱い、末尾スラッシュは除去）
pub fn resolve_api_base(env: Option<String>, configured: Option<&str>) -> String {
    env.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| configured.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_API_BASE)
        .trim_end_matches('/')
        .to_string()
}

/// http(s) のURLか確認
pub fn validate_api_base(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(PlantDoctorError::Config(format!(
            "http:// または https:// で始まるURLを指定してください: {}",
            url
        )))
    }
}
