//! 診断サービスHTTPクライアント
//!
//! - multipart（フィールド名 `file`）でPOST
//! - 本文をチャンクに分けて流し、送信済みバイト数から進捗を通知
//! - 60秒で打ち切り、リトライはしない

use std::time::Duration;

use futures_util::stream;
use plant_doctor_common::parser::{parse_envelope, parse_health, progress_percent};
use plant_doctor_common::service::{endpoint_url, HEALTH_PATH, UPLOAD_FIELD};
use plant_doctor_common::{
    DiagnosisResult, DiagnosisService, Error, FileMeta, HealthReport, MediaKind,
    REQUEST_TIMEOUT_SECS,
};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::sync::mpsc;

use crate::error::{PlantDoctorError, Result};

/// 送信チャンクサイズ
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct HttpDiagnosisClient {
    http: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl HttpDiagnosisClient {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// タイムアウト指定付き（テスト用に短くできる）
    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlantDoctorError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base: base.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout.as_secs())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl DiagnosisService for HttpDiagnosisClient {
    type Payload = Vec<u8>;

    async fn analyse(
        &self,
        file: &FileMeta,
        payload: &Vec<u8>,
        kind: MediaKind,
        on_progress: &dyn Fn(u8),
    ) -> plant_doctor_common::Result<DiagnosisResult> {
        let url = endpoint_url(&self.base, kind.endpoint());
        let total = payload.len() as u64;

        // 本文ストリームは 'static が必要なため、進捗はチャネル経由で受け取る
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let chunks: Vec<Vec<u8>> = payload.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            let _ = tx.send(sent);
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| Error::Network(e.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(url = %url, bytes = total, "解析リクエスト送信");

        let request = self.http.post(&url).multipart(form).send();
        tokio::pin!(request);

        let response = loop {
            tokio::select! {
                biased;
                Some(sent) = rx.recv() => {
                    if let Some(percent) = progress_percent(sent, total) {
                        on_progress(percent);
                    }
                }
                response = &mut request => break response,
            }
        };

        let response = response.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        tracing::debug!(status, bytes = body.len(), "解析レスポンス受信");
        parse_envelope(status, &body)
    }

    async fn check_health(&self) -> plant_doctor_common::Result<HealthReport> {
        let url = endpoint_url(&self.base, HEALTH_PATH);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        parse_health(status, &body)
    }
}
