//! APIレスポンスパーサー
//!
//! 解析API・ヘルスチェックAPIの応答本文を共通型に変換する。
//! ネイティブ(reqwest)とブラウザ(XMLHttpRequest)の両クライアントから使う。

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{DiagnosisEnvelope, DiagnosisResult, HealthReport};

/// `success: false` でエラー文が無い場合のメッセージ
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed";

/// FastAPI形式のエラー本文 `{ "detail": ... }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// 解析APIの応答をパース
///
/// # Arguments
/// * `status_code` - HTTPステータスコード
/// * `body` - 応答本文
///
/// # Returns
/// * `Ok(DiagnosisResult)` - 2xx かつ `success: true`
/// * `Err(Error::Service)` - それ以外（サービス側メッセージを優先）
pub fn parse_envelope(status_code: u16, body: &str) -> Result<DiagnosisResult> {
    if !(200..300).contains(&status_code) {
        return Err(Error::Service(error_detail(status_code, body)));
    }

    let envelope: DiagnosisEnvelope = serde_json::from_str(body.trim())
        .map_err(|e| Error::Service(format!("Invalid response from diagnosis service: {}", e)))?;

    if !envelope.success {
        let message = envelope
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| ANALYSIS_FAILED_MESSAGE.to_string());
        return Err(Error::Service(message));
    }

    envelope
        .result
        .ok_or_else(|| Error::Service(ANALYSIS_FAILED_MESSAGE.to_string()))
}

/// ヘルスチェック応答をパース
pub fn parse_health(status_code: u16, body: &str) -> Result<HealthReport> {
    if !(200..300).contains(&status_code) {
        return Err(Error::Service(error_detail(status_code, body)));
    }
    Ok(serde_json::from_str(body.trim())?)
}

/// 送信済みバイト数から進捗率(0-100)を計算
///
/// 総量が不明(0)なら `None`。
pub fn progress_percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = ((sent as f64) * 100.0 / (total as f64)).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// 失敗応答からメッセージを取り出す
///
/// 優先順位:
/// 1. `detail`（文字列、またはバリデーションエラー配列の `msg` を連結）
/// 2. `error`
/// 3. ステータスコードのみのメッセージ
fn error_detail(status_code: u16, body: &str) -> String {
    let parsed: Option<ErrorBody> = serde_json::from_str(body.trim()).ok();

    if let Some(parsed) = parsed {
        if let Some(detail) = parsed.detail.and_then(detail_text) {
            return detail;
        }
        if let Some(error) = parsed.error.filter(|e| !e.trim().is_empty()) {
            return error;
        }
    }

    format!("Request failed with status {}", status_code)
}

fn detail_text(detail: Value) -> Option<String> {
    let text = match detail {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("msg").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => return None,
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HealthStatus;

    // =============================================
    // parse_envelope テスト
    // =============================================

    #[test]
    fn test_parse_success_envelope() {
        let body = r#"{
            "success": true,
            "result": {"status": "healthy", "is_healthy": true, "summary": "Looks great"},
            "filename": "leaf.jpg",
            "file_type": "image"
        }"#;

        let result = parse_envelope(200, body).expect("パース失敗");
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.is_healthy);
    }

    #[test]
    fn test_parse_failure_envelope_keeps_message() {
        let body = r#"{"success": false, "error": "quota exceeded"}"#;
        let err = parse_envelope(200, body).unwrap_err();
        assert!(matches!(&err, Error::Service(m) if m == "quota exceeded"));
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn test_parse_failure_envelope_without_message() {
        let err = parse_envelope(200, r#"{"success": false}"#).unwrap_err();
        assert_eq!(err.user_message(), ANALYSIS_FAILED_MESSAGE);
    }

    #[test]
    fn test_parse_success_without_result() {
        let err = parse_envelope(200, r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn test_parse_http_error_uses_detail() {
        let body = r#"{"detail": "Unsupported file type"}"#;
        let err = parse_envelope(400, body).unwrap_err();
        assert_eq!(err.user_message(), "Unsupported file type");
    }

    #[test]
    fn test_parse_http_error_validation_array() {
        let body = r#"{"detail": [{"loc": ["body", "file"], "msg": "field required"}]}"#;
        let err = parse_envelope(422, body).unwrap_err();
        assert_eq!(err.user_message(), "field required");
    }

    #[test]
    fn test_parse_http_error_without_body() {
        let err = parse_envelope(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status 502");
    }

    #[test]
    fn test_parse_invalid_json_on_success_status() {
        let err = parse_envelope(200, "not json").unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn test_parse_health() {
        let report = parse_health(200, r#"{"gemini_api_configured": false}"#).unwrap();
        assert!(!report.service_configured());

        assert!(parse_health(500, "").is_err());
    }

    // =============================================
    // progress_percent テスト
    // =============================================

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 200), Some(0));
        assert_eq!(progress_percent(1, 3), Some(33));
        assert_eq!(progress_percent(2, 3), Some(67));
        assert_eq!(progress_percent(200, 200), Some(100));
    }

    #[test]
    fn test_progress_percent_unknown_total() {
        assert_eq!(progress_percent(10, 0), None);
    }

    #[test]
    fn test_progress_percent_clamps() {
        assert_eq!(progress_percent(300, 200), Some(100));
    }
}
