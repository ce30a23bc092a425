//! 診断結果の型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - DiagnosisResult: サービスが返す診断内容
//! - DiagnosisEnvelope: `{ success, result?, error? }` のラッパー
//! - HealthReport: `/api/health` の応答
//!
//! AIの出力は型が揺れる（配列のはずが文字列、文字列のはずが配列など）ため、
//! デシリアライズは寛容にしている。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::service::{ANALYSE_IMAGE_PATH, ANALYSE_VIDEO_PATH};

/// 健康状態（閉じた列挙、未知の値は Unknown）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Diseased,
    #[default]
    Unknown,
}

impl HealthStatus {
    /// 文字列から変換（大文字小文字・前後空白は無視）
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "healthy" => HealthStatus::Healthy,
            "diseased" => HealthStatus::Diseased,
            _ => HealthStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Diseased => "diseased",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(label)) => HealthStatus::from_label(&label),
            _ => HealthStatus::Unknown,
        })
    }
}

/// 植物の診断結果
///
/// `status` と `is_healthy` は独立した2つの信号で、一致は保証されない。
/// 表示の分岐は `is_healthy`、アイコン類は `status` で行う。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(default)]
    pub status: HealthStatus,

    #[serde(default)]
    pub is_healthy: bool,

    #[serde(default, deserialize_with = "lenient_text")]
    pub plant_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_summary")]
    pub summary: String,

    /// "High" / "Medium" / "Low" などのラベル
    #[serde(default, deserialize_with = "lenient_text")]
    pub confidence: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub problems: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub reasons: Vec<String>,

    /// 手順の順番に意味がある
    #[serde(default, deserialize_with = "lenient_list")]
    pub solutions: Vec<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_tips: Option<String>,
}

impl DiagnosisResult {
    /// `status` と `is_healthy` が食い違っているか
    pub fn has_status_mismatch(&self) -> bool {
        match self.status {
            HealthStatus::Healthy => !self.is_healthy,
            HealthStatus::Diseased => self.is_healthy,
            HealthStatus::Unknown => false,
        }
    }
}

/// 解析APIのトップレベル応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisEnvelope {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub result: Option<DiagnosisResult>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub file_type: Option<String>,
}

/// `/api/health` の応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub service: Option<String>,

    /// AIの認証情報がサービス側に設定済みか
    #[serde(default)]
    pub gemini_api_configured: bool,

    #[serde(default)]
    pub message: Option<String>,
}

impl HealthReport {
    pub fn service_configured(&self) -> bool {
        self.gemini_api_configured
    }
}

/// メディア種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// 申告されたContent-Typeから判定（`video/` で始まれば動画、それ以外は画像）
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.trim().to_ascii_lowercase().starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// 解析エンドポイントのパス
    pub fn endpoint(&self) -> &'static str {
        match self {
            MediaKind::Image => ANALYSE_IMAGE_PATH,
            MediaKind::Video => ANALYSE_VIDEO_PATH,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// 配列 / 単一文字列 / null を Vec<String> に揃える
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(value_to_text).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// 文字列 / 配列（空白で連結） / null を Option<String> に揃える
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(value_to_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Some(other) => value_to_text(other),
        None => None,
    };
    Ok(text.filter(|s| !s.trim().is_empty()))
}

fn lenient_summary<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}
