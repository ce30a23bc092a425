//! 診断サービスのブラウザ用クライアント
//!
//! アップロード進捗を取るため fetch ではなく XMLHttpRequest を使う。

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt};
use plant_doctor_common::parser::{parse_envelope, parse_health, progress_percent};
use plant_doctor_common::service::{endpoint_url, HEALTH_PATH, UPLOAD_FIELD};
use plant_doctor_common::{
    DiagnosisResult, DiagnosisService, Error, FileMeta, HealthReport, MediaKind, Result,
    DEFAULT_API_BASE, REQUEST_TIMEOUT_SECS,
};
use wasm_bindgen::prelude::*;
use web_sys::{File, FormData, ProgressEvent, XmlHttpRequest};

/// ビルド時に埋め込む接続先
const API_BASE: Option<&str> = option_env!("PLANT_DOCTOR_API_BASE_URL");

/// XHRの終わり方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XhrOutcome {
    Loaded,
    Failed,
    TimedOut,
}

type Handler = Closure<dyn FnMut(ProgressEvent)>;

/// 送信中のリクエスト
struct PendingXhr {
    xhr: XmlHttpRequest,
    done: oneshot::Receiver<XhrOutcome>,
    _handlers: Vec<Handler>,
}

impl PendingXhr {
    fn detach(&self) {
        self.xhr.set_onload(None);
        self.xhr.set_onerror(None);
        self.xhr.set_ontimeout(None);
        if let Ok(upload) = self.xhr.upload() {
            upload.set_onprogress(None);
        }
    }

    fn into_response(self, outcome: XhrOutcome, timeout_ms: u32) -> Result<(u16, String)> {
        self.detach();
        match outcome {
            XhrOutcome::TimedOut => Err(Error::Timeout(u64::from(timeout_ms / 1000))),
            XhrOutcome::Failed => Err(Error::Network(
                "Could not reach the diagnosis service".to_string(),
            )),
            XhrOutcome::Loaded => {
                let status = self.xhr.status().map_err(js_error)?;
                let body = self.xhr.response_text().map_err(js_error)?;
                Ok((status, body.unwrap_or_default()))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserDiagnosisClient {
    base: String,
    timeout_ms: u32,
}

impl BrowserDiagnosisClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            timeout_ms: (REQUEST_TIMEOUT_SECS * 1000) as u32,
        }
    }

    /// ビルド時の設定（無ければ既定値）で作成
    pub fn from_build_env() -> Self {
        Self::new(
            API_BASE
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_API_BASE),
        )
    }

    fn start(
        &self,
        method: &str,
        url: &str,
        form: Option<&FormData>,
        progress: Option<mpsc::UnboundedSender<u8>>,
    ) -> Result<PendingXhr> {
        let xhr = XmlHttpRequest::new().map_err(js_error)?;
        xhr.open_with_async(method, url, true).map_err(js_error)?;
        xhr.set_timeout(self.timeout_ms);

        let (done_tx, done) = oneshot::channel();
        let done_tx = Rc::new(RefCell::new(Some(done_tx)));
        let finish = move |outcome: XhrOutcome| {
            let done_tx = Rc::clone(&done_tx);
            Closure::wrap(Box::new(move |_: ProgressEvent| {
                if let Some(tx) = done_tx.borrow_mut().take() {
                    let _ = tx.send(outcome);
                }
            }) as Box<dyn FnMut(_)>)
        };

        let on_load = finish(XhrOutcome::Loaded);
        let on_error = finish(XhrOutcome::Failed);
        let on_timeout = finish(XhrOutcome::TimedOut);
        xhr.set_onload(Some(on_load.as_ref().unchecked_ref()));
        xhr.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        xhr.set_ontimeout(Some(on_timeout.as_ref().unchecked_ref()));
        let mut handlers = vec![on_load, on_error, on_timeout];

        if let Some(tx) = progress {
            let on_progress = Closure::wrap(Box::new(move |ev: ProgressEvent| {
                if !ev.length_computable() {
                    return;
                }
                if let Some(percent) = progress_percent(ev.loaded() as u64, ev.total() as u64) {
                    let _ = tx.unbounded_send(percent);
                }
            }) as Box<dyn FnMut(_)>);
            xhr.upload()
                .map_err(js_error)?
                .set_onprogress(Some(on_progress.as_ref().unchecked_ref()));
            handlers.push(on_progress);
        }

        xhr.send_with_opt_form_data(form).map_err(js_error)?;

        Ok(PendingXhr {
            xhr,
            done,
            _handlers: handlers,
        })
    }
}

impl DiagnosisService for BrowserDiagnosisClient {
    type Payload = File;

    async fn analyse(
        &self,
        file: &FileMeta,
        payload: &File,
        kind: MediaKind,
        on_progress: &dyn Fn(u8),
    ) -> Result<DiagnosisResult> {
        let url = endpoint_url(&self.base, kind.endpoint());
        let form = FormData::new().map_err(js_error)?;
        form.append_with_blob_and_filename(UPLOAD_FIELD, payload, &file.name)
            .map_err(js_error)?;

        let (tx, mut rx) = mpsc::unbounded();
        let mut pending = self.start("POST", &url, Some(&form), Some(tx))?;

        let outcome = {
            let mut done = (&mut pending.done).fuse();
            loop {
                futures::select! {
                    percent = rx.next() => {
                        if let Some(percent) = percent {
                            on_progress(percent);
                        }
                    }
                    outcome = done => break outcome.unwrap_or(XhrOutcome::Failed),
                }
            }
        };
        while let Ok(Some(percent)) = rx.try_next() {
            on_progress(percent);
        }

        let (status, body) = pending.into_response(outcome, self.timeout_ms)?;
        parse_envelope(status, &body)
    }

    async fn check_health(&self) -> Result<HealthReport> {
        let url = endpoint_url(&self.base, HEALTH_PATH);
        let mut pending = self.start("GET", &url, None, None)?;
        let outcome = (&mut pending.done).await.unwrap_or(XhrOutcome::Failed);

        let (status, body) = pending.into_response(outcome, self.timeout_ms)?;
        parse_health(status, &body)
    }
}

fn js_error(err: JsValue) -> Error {
    Error::Network(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}
