//! 解析セッション
//!
//! 1件のアップロードを「送信 → 解析中 → 成功/失敗」と進める状態機械。
//! 成功したセッションは履歴に積む。
//!
//! 状態遷移:
//! - Idle/Success/Failure → Submitting: `begin`（解析中の再投入は `Error::Busy`）
//! - Submitting → Submitting: `report_progress`
//! - Submitting → Success/Failure: `complete`
//! - Success/Failure → Idle: `reset`
//! - Idle/Success/Failure → Success(表示のみ): `select_history`
//!
//! 通知は表示方法を持たず、登録されたリスナーへ `SessionEvent` を渡すだけにする。

use std::cell::Cell;
use std::fmt;

use crate::error::{Error, Result};
use crate::history::{History, HistoryEntry};
use crate::preview::Preview;
use crate::service::DiagnosisService;
use crate::types::{DiagnosisResult, MediaKind};
use crate::upload::FileMeta;

/// セッション状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Failure,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Success => "success",
            SessionStatus::Failure => "failure",
        }
    }
}

/// 一時的な通知イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AnalysisSucceeded {
        healthy: bool,
        plant_name: Option<String>,
        file_name: String,
    },
    AnalysisFailed {
        message: String,
    },
}

impl SessionEvent {
    /// 通知文
    pub fn notification(&self) -> String {
        match self {
            SessionEvent::AnalysisSucceeded { healthy: true, .. } => {
                "Plant looks healthy! 🌿".to_string()
            }
            SessionEvent::AnalysisSucceeded { healthy: false, .. } => {
                "Issues detected. Check the diagnosis below.".to_string()
            }
            SessionEvent::AnalysisFailed { message } => message.clone(),
        }
    }

    /// 良い知らせか（健康と判定された場合のみ）
    pub fn is_positive(&self) -> bool {
        matches!(self, SessionEvent::AnalysisSucceeded { healthy: true, .. })
    }
}

/// 送信開始時に確定した内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub file: FileMeta,
    pub kind: MediaKind,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// 解析セッション
pub struct AnalysisSession {
    status: SessionStatus,
    file_name: Option<String>,
    media_kind: Option<MediaKind>,
    preview: Option<Preview>,
    progress: u8,
    result: Option<DiagnosisResult>,
    error: Option<String>,
    history: History,
    next_id: u64,
    listeners: Vec<Listener>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::with_history(History::new())
    }

    pub fn with_history(history: History) -> Self {
        Self {
            status: SessionStatus::Idle,
            file_name: None,
            media_kind: None,
            preview: None,
            progress: 0,
            result: None,
            error: None,
            history,
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    /// 通知リスナーを登録
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // =============================================
    // 状態参照
    // =============================================

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == SessionStatus::Submitting
    }

    /// 送信進捗(0-100)。Submitting中のみ意味を持つ
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result(&self) -> Option<&DiagnosisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media_kind
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // =============================================
    // 状態遷移
    // =============================================

    /// 送信開始
    ///
    /// 解析中なら `Error::Busy` を返し、進行中のセッションには触れない。
    pub fn begin(&mut self, file: FileMeta, preview: Preview) -> Result<Submission> {
        if self.is_busy() {
            tracing::debug!(file = %file.name, "解析中のため投入を拒否");
            return Err(Error::Busy);
        }

        let kind = file.media_kind();
        self.status = SessionStatus::Submitting;
        self.result = None;
        self.error = None;
        self.progress = 0;
        self.media_kind = Some(kind);
        self.file_name = Some(file.name.clone());
        self.preview = Some(preview);

        tracing::debug!(file = %file.name, kind = %kind, "解析開始");
        Ok(Submission { file, kind })
    }

    /// 送信進捗を反映（減少はしない）
    pub fn report_progress(&mut self, percent: u8) {
        if self.is_busy() {
            self.progress = self.progress.max(percent.min(100));
        }
    }

    /// 解析結果を反映
    ///
    /// Submitting以外では何もしない。
    pub fn complete(
        &mut self,
        outcome: Result<DiagnosisResult>,
        timestamp_ms: u64,
    ) -> Option<SessionEvent> {
        if !self.is_busy() {
            tracing::debug!(status = self.status.as_str(), "完了通知を無視");
            return None;
        }
        Some(self.finish(outcome, timestamp_ms))
    }

    fn finish(&mut self, outcome: Result<DiagnosisResult>, timestamp_ms: u64) -> SessionEvent {
        self.progress = 0;
        let file_name = self.file_name.clone().unwrap_or_default();

        let event = match outcome {
            Ok(result) => {
                if result.has_status_mismatch() {
                    tracing::warn!(
                        status = result.status.as_str(),
                        is_healthy = result.is_healthy,
                        "status と is_healthy が一致しない"
                    );
                }

                if let (Some(preview), Some(kind)) = (self.preview.clone(), self.media_kind) {
                    let entry = HistoryEntry {
                        id: self.next_id,
                        file_name: file_name.clone(),
                        media_kind: kind,
                        preview,
                        result: result.clone(),
                        timestamp_ms,
                    };
                    self.next_id += 1;
                    if let Some(evicted) = self.history.push(entry) {
                        tracing::debug!(id = evicted.id, "履歴から追い出し");
                    }
                }

                let event = SessionEvent::AnalysisSucceeded {
                    healthy: result.is_healthy,
                    plant_name: result.plant_name.clone(),
                    file_name,
                };
                self.status = SessionStatus::Success;
                self.error = None;
                self.result = Some(result);
                event
            }
            Err(e) => {
                let message = e.user_message();
                tracing::debug!(error = %message, timeout = e.is_timeout(), "解析失敗");
                self.status = SessionStatus::Failure;
                self.result = None;
                self.error = Some(message.clone());
                SessionEvent::AnalysisFailed { message }
            }
        };

        for listener in &self.listeners {
            listener(&event);
        }
        event
    }

    /// 初期状態に戻す（解析中は不可）
    pub fn reset(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.status = SessionStatus::Idle;
        self.result = None;
        self.error = None;
        self.preview = None;
        self.media_kind = None;
        self.file_name = None;
        self.progress = 0;
        true
    }

    /// 履歴エントリを表示に復元する
    ///
    /// サービスには問い合わせず、履歴も変更しない。
    pub fn select_history(&mut self, id: u64) -> bool {
        if self.is_busy() {
            return false;
        }
        let Some(entry) = self.history.get(id) else {
            return false;
        };

        self.preview = Some(entry.preview.clone());
        self.result = Some(entry.result.clone());
        self.media_kind = Some(entry.media_kind);
        self.file_name = Some(entry.file_name.clone());
        self.error = None;
        self.progress = 0;
        self.status = SessionStatus::Success;
        true
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// 送信から完了までを一括で実行
    ///
    /// `on_progress` には減少しない値だけを渡す。
    pub async fn analyse<S, N>(
        &mut self,
        service: &S,
        file: FileMeta,
        payload: &S::Payload,
        preview: Preview,
        now_ms: N,
        on_progress: &dyn Fn(u8),
    ) -> Result<SessionEvent>
    where
        S: DiagnosisService,
        N: FnOnce() -> u64,
    {
        let submission = self.begin(file, preview)?;

        let last = Cell::new(0u8);
        let forward = |percent: u8| {
            let percent = percent.min(100);
            if percent >= last.get() {
                last.set(percent);
                on_progress(percent);
            }
        };

        let outcome = service
            .analyse(&submission.file, payload, submission.kind, &forward)
            .await;

        Ok(self.finish(outcome, now_ms()))
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("status", &self.status)
            .field("file_name", &self.file_name)
            .field("media_kind", &self.media_kind)
            .field("progress", &self.progress)
            .field("error", &self.error)
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_CAPACITY;
    use crate::types::{HealthReport, HealthStatus};
    use futures::executor::block_on;
    use std::sync::{Arc, Mutex};

    /// 決まった応答と進捗を返すサービス
    struct StubService {
        progress: Vec<u8>,
        outcome: fn() -> Result<DiagnosisResult>,
        calls: Cell<usize>,
    }

    impl StubService {
        fn new(outcome: fn() -> Result<DiagnosisResult>) -> Self {
            Self {
                progress: vec![10, 40, 40, 30, 100],
                outcome,
                calls: Cell::new(0),
            }
        }
    }

    impl DiagnosisService for StubService {
        type Payload = Vec<u8>;

        async fn analyse(
            &self,
            _file: &FileMeta,
            _payload: &Vec<u8>,
            _kind: MediaKind,
            on_progress: &dyn Fn(u8),
        ) -> Result<DiagnosisResult> {
            self.calls.set(self.calls.get() + 1);
            for p in &self.progress {
                on_progress(*p);
            }
            (self.outcome)()
        }

        async fn check_health(&self) -> Result<HealthReport> {
            Ok(HealthReport::default())
        }
    }

    fn healthy() -> Result<DiagnosisResult> {
        Ok(DiagnosisResult {
            status: HealthStatus::Healthy,
            is_healthy: true,
            plant_name: Some("Monstera".to_string()),
            summary: "Thriving".to_string(),
            ..Default::default()
        })
    }

    fn quota_exceeded() -> Result<DiagnosisResult> {
        Err(Error::Service("quota exceeded".to_string()))
    }

    fn timed_out() -> Result<DiagnosisResult> {
        Err(Error::Timeout(60))
    }

    fn jpeg() -> FileMeta {
        FileMeta::new("leaf.jpg", "image/jpeg", 2048)
    }

    fn tracked_preview(url: &str, released: &Arc<Mutex<Vec<String>>>) -> Preview {
        let sink = Arc::clone(released);
        Preview::new(url, move |u| sink.lock().unwrap().push(u.to_string()))
    }

    fn run(session: &mut AnalysisSession, service: &StubService, url: &str) -> Result<SessionEvent> {
        block_on(session.analyse(
            service,
            jpeg(),
            &Vec::new(),
            Preview::unmanaged(url),
            || 1_700_000_000_000,
            &|_| {},
        ))
    }

    #[test]
    fn test_successful_analysis() {
        let service = StubService::new(healthy);
        let mut session = AnalysisSession::new();
        let seen = Mutex::new(Vec::new());

        let event = block_on(session.analyse(
            &service,
            jpeg(),
            &Vec::new(),
            Preview::unmanaged("blob:1"),
            || 42,
            &|p| seen.lock().unwrap().push(p),
        ))
        .unwrap();

        assert!(event.is_positive());
        assert_eq!(session.status(), SessionStatus::Success);
        assert_eq!(session.progress(), 0);
        assert!(session.error().is_none());
        assert_eq!(session.media_kind(), Some(MediaKind::Image));

        // 減少した値(30)は渡らない
        assert_eq!(*seen.lock().unwrap(), vec![10, 40, 40, 100]);

        let entry = session.history().latest().expect("履歴が追加されるはず");
        assert_eq!(entry.file_name, "leaf.jpg");
        assert_eq!(entry.timestamp_ms, 42);
        assert_eq!(entry.preview.url(), "blob:1");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_unhealthy_result_emits_negative_event() {
        fn diseased() -> Result<DiagnosisResult> {
            Ok(DiagnosisResult {
                status: HealthStatus::Diseased,
                is_healthy: false,
                ..Default::default()
            })
        }
        let service = StubService::new(diseased);
        let mut session = AnalysisSession::new();

        let event = run(&mut session, &service, "blob:1").unwrap();
        assert!(!event.is_positive());
        assert_eq!(event.notification(), "Issues detected. Check the diagnosis below.");
    }

    #[test]
    fn test_service_failure_message() {
        let service = StubService::new(quota_exceeded);
        let mut session = AnalysisSession::new();

        let event = run(&mut session, &service, "blob:1").unwrap();
        assert_eq!(
            event,
            SessionEvent::AnalysisFailed {
                message: "quota exceeded".to_string()
            }
        );
        assert_eq!(session.status(), SessionStatus::Failure);
        assert_eq!(session.error(), Some("quota exceeded"));
        assert!(session.result().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_timeout_creates_no_history() {
        let service = StubService::new(timed_out);
        let mut session = AnalysisSession::new();

        run(&mut session, &service, "blob:1").unwrap();
        assert_eq!(session.status(), SessionStatus::Failure);
        assert!(session.error().unwrap().contains("timed out"));
        assert!(session.history().is_empty());
        assert_eq!(session.progress(), 0);
    }

    #[test]
    fn test_reset_from_failure_clears_everything() {
        let service = StubService::new(quota_exceeded);
        let mut session = AnalysisSession::new();
        run(&mut session, &service, "blob:1").unwrap();

        assert!(session.reset());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.result().is_none());
        assert!(session.error().is_none());
        assert!(session.preview().is_none());
        assert!(session.media_kind().is_none());
        assert_eq!(session.progress(), 0);
    }

    #[test]
    fn test_busy_rejects_second_submission() {
        let mut session = AnalysisSession::new();
        session.begin(jpeg(), Preview::unmanaged("blob:1")).unwrap();
        session.report_progress(55);

        let err = session
            .begin(FileMeta::new("b.png", "image/png", 10), Preview::unmanaged("blob:2"))
            .unwrap_err();
        assert!(matches!(err, Error::Busy));

        // 進行中のセッションはそのまま
        assert_eq!(session.file_name(), Some("leaf.jpg"));
        assert_eq!(session.progress(), 55);
        assert!(!session.reset());
        assert!(!session.select_history(1));
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut session = AnalysisSession::new();
        session.report_progress(20);
        assert_eq!(session.progress(), 0, "Idle中は無視");

        session.begin(jpeg(), Preview::unmanaged("blob:1")).unwrap();
        session.report_progress(20);
        session.report_progress(10);
        session.report_progress(250);
        assert_eq!(session.progress(), 100);
    }

    #[test]
    fn test_complete_outside_submitting_is_ignored() {
        let mut session = AnalysisSession::new();
        assert!(session.complete(healthy(), 0).is_none());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_step_api_classifies_video() {
        let mut session = AnalysisSession::new();
        let submission = session
            .begin(FileMeta::new("clip.webm", "video/webm", 10), Preview::unmanaged("blob:v"))
            .unwrap();
        assert_eq!(submission.kind, MediaKind::Video);
        assert_eq!(session.status(), SessionStatus::Submitting);

        session.complete(healthy(), 5).unwrap();
        assert_eq!(session.history().latest().unwrap().media_kind, MediaKind::Video);
    }

    #[test]
    fn test_new_submission_after_success_clears_result() {
        let mut session = AnalysisSession::new();
        session.begin(jpeg(), Preview::unmanaged("blob:1")).unwrap();
        session.complete(healthy(), 1).unwrap();

        session.begin(jpeg(), Preview::unmanaged("blob:2")).unwrap();
        assert!(session.result().is_none());
        assert_eq!(session.preview().unwrap().url(), "blob:2");
    }

    #[test]
    fn test_history_is_bounded() {
        let service = StubService::new(healthy);
        let mut session = AnalysisSession::new();

        for i in 0..(HISTORY_CAPACITY + 5) {
            run(&mut session, &service, &format!("blob:{}", i)).unwrap();
            assert!(session.history().len() <= HISTORY_CAPACITY);
        }
        assert_eq!(session.history().len(), HISTORY_CAPACITY);
        assert_eq!(service.calls.get(), HISTORY_CAPACITY + 5);

        let ids: Vec<u64> = session.history().iter().map(|e| e.id).collect();
        assert_eq!(ids.first(), Some(&15));
        assert_eq!(ids.last(), Some(&6));
    }

    #[test]
    fn test_select_history_is_idempotent() {
        let service = StubService::new(healthy);
        let mut session = AnalysisSession::new();
        run(&mut session, &service, "blob:1").unwrap();
        run(&mut session, &service, "blob:2").unwrap();

        let before: Vec<u64> = session.history().iter().map(|e| e.id).collect();

        assert!(session.select_history(1));
        let first = (session.result().cloned(), session.preview().cloned());
        assert!(session.select_history(1));
        let second = (session.result().cloned(), session.preview().cloned());

        assert_eq!(first, second);
        assert_eq!(session.preview().unwrap().url(), "blob:1");
        assert_eq!(session.status(), SessionStatus::Success);

        let after: Vec<u64> = session.history().iter().map(|e| e.id).collect();
        assert_eq!(before, after);
        assert!(!session.select_history(99));
    }

    #[test]
    fn test_select_history_clears_error() {
        let mut session = AnalysisSession::new();
        session.begin(jpeg(), Preview::unmanaged("blob:1")).unwrap();
        session.complete(healthy(), 1).unwrap();
        session.begin(jpeg(), Preview::unmanaged("blob:2")).unwrap();
        session.complete(quota_exceeded(), 2).unwrap();
        assert!(session.error().is_some());

        assert!(session.select_history(1));
        assert!(session.error().is_none());
        assert!(session.result().is_some());
    }

    #[test]
    fn test_listeners_receive_events() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut session = AnalysisSession::new();
        session.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        run(&mut session, &StubService::new(healthy), "blob:1").unwrap();
        run(&mut session, &StubService::new(quota_exceeded), "blob:2").unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert!(received[0].is_positive());
        assert_eq!(received[1].notification(), "quota exceeded");
    }

    #[test]
    fn test_preview_released_on_reset_when_not_in_history() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut session = AnalysisSession::new();

        session.begin(jpeg(), tracked_preview("blob:fail", &released)).unwrap();
        session.complete(quota_exceeded(), 1).unwrap();
        assert!(released.lock().unwrap().is_empty());

        session.reset();
        assert_eq!(*released.lock().unwrap(), vec!["blob:fail".to_string()]);
    }

    #[test]
    fn test_preview_kept_while_history_holds_it() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut session = AnalysisSession::new();

        session.begin(jpeg(), tracked_preview("blob:ok", &released)).unwrap();
        session.complete(healthy(), 1).unwrap();
        assert_eq!(session.preview().unwrap().share_count(), 2);

        session.reset();
        assert!(released.lock().unwrap().is_empty());

        session.clear_history();
        assert_eq!(*released.lock().unwrap(), vec!["blob:ok".to_string()]);
    }

    #[test]
    fn test_preview_released_on_eviction() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut session = AnalysisSession::new();

        for i in 0..=HISTORY_CAPACITY {
            session
                .begin(jpeg(), tracked_preview(&format!("blob:{}", i), &released))
                .unwrap();
            session.complete(healthy(), i as u64).unwrap();
        }

        // 最新のプレビューは表示中、最古は追い出されて解放済み
        assert_eq!(*released.lock().unwrap(), vec!["blob:0".to_string()]);
    }

    #[test]
    fn test_rejected_preview_is_released() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut session = AnalysisSession::new();
        session.begin(jpeg(), Preview::unmanaged("blob:1")).unwrap();

        let result = session.begin(jpeg(), tracked_preview("blob:2", &released));
        assert!(result.is_err());
        assert_eq!(*released.lock().unwrap(), vec!["blob:2".to_string()]);
    }
}
