//! 端末シェル
//!
//! 解析セッションを端末から操作する。ブラウザ版の画面と同じ状態機械を使い、
//! 描画だけを端末向けに置き換える。

use std::path::{Path, PathBuf};

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use plant_doctor_common::presentation::{SectionKind, SectionToggles};
use plant_doctor_common::{
    AnalysisSession, BackendStatus, DiagnosisResult, DiagnosisService, Error, HealthReport,
    Preview, SessionEvent, SessionStatus, UploadDecision, UploadSurface,
};
use serde::Serialize;

use crate::error::{PlantDoctorError, Result};
use crate::render;
use crate::scanner::{self, Candidate};

/// 一括解析の1件分（`--json` 出力用）
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub file: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiagnosisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一括解析の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// 対話モードの操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    /// ファイルを解析
    Analyse(PathBuf),
    /// 履歴を開く
    Open(u64),
    /// 節の開閉
    Toggle(SectionKind),
    /// 履歴一覧
    List,
    /// 新しい解析（表示を初期化）
    Reset,
    /// 履歴を消去
    ClearHistory,
    Help,
    Quit,
}

/// 入力行を操作に変換
pub fn parse_action(input: &str) -> Option<ShellAction> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match (head, rest) {
        ("q" | "quit", "") => Some(ShellAction::Quit),
        ("?" | "help", "") => Some(ShellAction::Help),
        ("l" | "list", "") => Some(ShellAction::List),
        ("n" | "new", "") => Some(ShellAction::Reset),
        ("clear", "") => Some(ShellAction::ClearHistory),
        ("o" | "open", id) => id.parse().ok().map(ShellAction::Open),
        ("t" | "toggle", section) => section_from_key(section).map(ShellAction::Toggle),
        _ => Some(ShellAction::Analyse(PathBuf::from(trimmed))),
    }
}

fn section_from_key(key: &str) -> Option<SectionKind> {
    match key {
        "p" | "problems" => Some(SectionKind::Problems),
        "w" | "why" => Some(SectionKind::Reasons),
        "s" | "solutions" => Some(SectionKind::Treatment),
        "t" | "tips" => Some(SectionKind::Tips),
        _ => None,
    }
}

const HELP: &str = "\
操作:
  <パス>          ファイルを解析
  o <番号>        履歴を開く
  t p|w|s|t       節の開閉 (problems/why/solutions/tips)
  l               履歴一覧
  n               新しい解析
  clear           履歴を消去
  q               終了";

/// 端末シェル
pub struct Shell<S> {
    service: S,
    session: AnalysisSession,
    surface: UploadSurface,
    backend: BackendStatus,
    toggles: SectionToggles,
    show_progress: bool,
}

impl<S> Shell<S>
where
    S: DiagnosisService<Payload = Vec<u8>>,
{
    pub fn new(service: S) -> Self {
        let mut session = AnalysisSession::new();
        session.subscribe(|event| eprintln!("{}", render::render_notification(event)));

        Self {
            service,
            session,
            surface: UploadSurface::new(),
            backend: BackendStatus::default(),
            toggles: SectionToggles::new(),
            show_progress: true,
        }
    }

    /// 進捗バーを出さない（テスト・JSON出力用）
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// 全節を開いた状態で表示する
    pub fn expand_all(mut self) -> Self {
        for kind in SectionKind::ALL {
            if !self.toggles.is_open(kind) {
                self.toggles.toggle(kind);
            }
        }
        self
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn backend(&self) -> BackendStatus {
        self.backend
    }

    pub fn toggles(&self) -> &SectionToggles {
        &self.toggles
    }

    /// 接続確認
    pub async fn probe_backend(&mut self) -> plant_doctor_common::Result<HealthReport> {
        let probe = self.service.check_health().await;
        self.backend = BackendStatus::from_probe(&probe);
        match &probe {
            Ok(report) => tracing::debug!(?report, "ヘルスチェック応答"),
            Err(e) => tracing::warn!(error = %e, "ヘルスチェック失敗"),
        }
        probe
    }

    /// 1ファイルを検査して解析
    ///
    /// 検査で弾かれたファイルはサービスに送らない。
    pub async fn analyse_candidate(&mut self, candidate: &Candidate) -> Result<SessionEvent> {
        let decision = self
            .surface
            .offer(std::slice::from_ref(&candidate.meta), self.session.is_busy());

        let (file, kind) = match decision {
            UploadDecision::Accepted(file, kind) => (file, kind),
            UploadDecision::Rejected(reason) => {
                tracing::debug!(file = %candidate.meta.name, %reason, "ファイルを拒否");
                return Err(Error::Validation(reason).into());
            }
            UploadDecision::Ignored => return Err(Error::Busy.into()),
        };

        let payload = candidate.read_payload()?;
        let preview = Preview::unmanaged(candidate.path.display().to_string());

        let bar = self.progress_bar(&file.name, kind.as_str());
        let event = self
            .session
            .analyse(&self.service, file, &payload, preview, now_ms, &|percent| {
                bar.set_position(u64::from(percent))
            })
            .await?;
        bar.finish_and_clear();

        self.toggles = SectionToggles::new();
        Ok(event)
    }

    fn progress_bar(&self, name: &str, kind: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30}] {pos}%") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(format!("📤 {} ({})", name, kind));
        bar
    }

    /// 表示中の結果を端末向けに
    pub fn render_current(&self) -> Option<String> {
        self.session
            .result()
            .map(|result| render::render_result(result, &self.toggles))
    }

    /// 複数ファイルを順に解析
    pub async fn run_batch(&mut self, paths: &[PathBuf], json: bool) -> Result<BatchSummary> {
        let candidates = scanner::collect_candidates(paths)?;
        if candidates.is_empty() {
            let joined = paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PlantDoctorError::NoFilesFound(joined));
        }

        let mut summary = BatchSummary::default();
        let mut records = Vec::new();

        for candidate in &candidates {
            if !json {
                println!("🌱 {}", candidate.meta.name);
            }

            let record = match self.analyse_candidate(candidate).await {
                Ok(SessionEvent::AnalysisSucceeded { .. }) => {
                    summary.succeeded += 1;
                    if !json {
                        if let Some(text) = self.render_current() {
                            println!("{}", text);
                        }
                    }
                    BatchRecord {
                        file: candidate.meta.name.clone(),
                        success: true,
                        result: self.session.result().cloned(),
                        error: None,
                    }
                }
                Ok(SessionEvent::AnalysisFailed { message }) => {
                    summary.failed += 1;
                    failed_record(candidate, message)
                }
                Err(PlantDoctorError::Diagnosis(e)) => {
                    summary.failed += 1;
                    let message = e.user_message();
                    eprintln!("✖ {}: {}", candidate.meta.name, message);
                    failed_record(candidate, message)
                }
                Err(e) => return Err(e),
            };
            records.push(record);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else if !self.session.history().is_empty() {
            println!("{}", render::render_history(self.session.history()));
        }

        Ok(summary)
    }

    /// 対話モード
    pub async fn run_interactive(&mut self) -> Result<()> {
        println!("🌿 Plant Doctor");
        let _ = self.probe_backend().await;
        println!("{}", render::render_backend_status(self.backend));
        println!("{}\n", HELP);

        loop {
            let prompt = match self.session.status() {
                SessionStatus::Success | SessionStatus::Failure => "次の操作 (n: 新しい解析)",
                _ => "写真/動画のパス",
            };
            let input: String = Input::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| PlantDoctorError::Prompt(e.to_string()))?;

            let Some(action) = parse_action(&input) else {
                continue;
            };

            match action {
                ShellAction::Quit => break,
                ShellAction::Help => println!("{}", HELP),
                ShellAction::List => {
                    let text = render::render_history(self.session.history());
                    if text.is_empty() {
                        println!("履歴はありません");
                    } else {
                        println!("{}", text);
                    }
                }
                ShellAction::Reset => {
                    self.session.reset();
                    self.toggles = SectionToggles::new();
                }
                ShellAction::ClearHistory => {
                    self.session.clear_history();
                    println!("✔ 履歴を消去しました");
                }
                ShellAction::Open(id) => {
                    if self.session.select_history(id) {
                        self.toggles = SectionToggles::new();
                        self.print_current();
                    } else {
                        println!("履歴 {} はありません", id);
                    }
                }
                ShellAction::Toggle(kind) => {
                    self.toggles.toggle(kind);
                    self.print_current();
                }
                ShellAction::Analyse(path) => self.analyse_path(&path).await?,
            }
        }

        Ok(())
    }

    async fn analyse_path(&mut self, path: &Path) -> Result<()> {
        let candidate = match Candidate::from_path(path) {
            Ok(candidate) => candidate,
            Err(e) => {
                eprintln!("✖ {}", e);
                return Ok(());
            }
        };

        match self.analyse_candidate(&candidate).await {
            Ok(SessionEvent::AnalysisSucceeded { .. }) => self.print_current(),
            Ok(SessionEvent::AnalysisFailed { message }) => {
                println!("❌ Analysis Failed\n{}\n(n: Try Again)", message);
            }
            Err(PlantDoctorError::Diagnosis(e)) => eprintln!("✖ {}", e.user_message()),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn print_current(&self) {
        if let Some(text) = self.render_current() {
            println!("{}", text);
        }
    }
}

fn failed_record(candidate: &Candidate, message: String) -> BatchRecord {
    BatchRecord {
        file: candidate.meta.name.clone(),
        success: false,
        result: None,
        error: Some(message),
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
