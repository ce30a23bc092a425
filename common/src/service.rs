//! 診断サービスとの接点
//!
//! 診断APIの呼び出し口をトレイトとして定義する。実装はプラットフォームごと:
//! - ネイティブ: reqwest（ルートクレート）
//! - ブラウザ: XMLHttpRequest（web-wasm）

use crate::error::Result;
use crate::types::{DiagnosisResult, HealthReport, MediaKind};
use crate::upload::FileMeta;

/// 画像解析エンドポイント
pub const ANALYSE_IMAGE_PATH: &str = "/api/analyse/image";
/// 動画解析エンドポイント
pub const ANALYSE_VIDEO_PATH: &str = "/api/analyse/video";
/// ヘルスチェックエンドポイント
pub const HEALTH_PATH: &str = "/api/health";
/// multipartのファイルフィールド名
pub const UPLOAD_FIELD: &str = "file";
/// 1回の通信の上限（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
/// 接続先の既定値
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// ベースURLとパスを連結（末尾スラッシュは無視）
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// 診断サービス
///
/// 1回の呼び出しにつき1回だけ送信する（リトライは呼び出し側の責任）。
/// `on_progress` は送信済み割合(0-100)で、総量が分かっている間だけ単調に呼ばれる。
#[allow(async_fn_in_trait)]
pub trait DiagnosisService {
    /// 送信するファイル本体（ネイティブはバイト列、ブラウザはFileオブジェクト）
    type Payload;

    async fn analyse(
        &self,
        file: &FileMeta,
        payload: &Self::Payload,
        kind: MediaKind,
        on_progress: &dyn Fn(u8),
    ) -> Result<DiagnosisResult>;

    async fn check_health(&self) -> Result<HealthReport>;

    async fn analyse_image(
        &self,
        file: &FileMeta,
        payload: &Self::Payload,
        on_progress: &dyn Fn(u8),
    ) -> Result<DiagnosisResult> {
        self.analyse(file, payload, MediaKind::Image, on_progress).await
    }

    async fn analyse_video(
        &self,
        file: &FileMeta,
        payload: &Self::Payload,
        on_progress: &dyn Fn(u8),
    ) -> Result<DiagnosisResult> {
        self.analyse(file, payload, MediaKind::Video, on_progress).await
    }
}
