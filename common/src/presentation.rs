//! 表示用モデル
//!
//! 診断結果・履歴・読み込み中表示・接続状態を、描画先（端末/ブラウザ）に
//! 依存しない形に変換する。描画側はこの結果をなぞるだけにする。

use crate::history::HistoryEntry;
use crate::types::{DiagnosisResult, HealthReport, HealthStatus};

/// 状態バッジ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub emoji: &'static str,
    /// CSSクラス名
    pub class: &'static str,
}

impl StatusBadge {
    pub fn for_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => StatusBadge {
                label: "✅ Healthy",
                emoji: "🌿",
                class: "status-healthy",
            },
            HealthStatus::Diseased => StatusBadge {
                label: "⚠️ Issue Detected",
                emoji: "🔬",
                class: "status-diseased",
            },
            HealthStatus::Unknown => StatusBadge {
                label: "❓ Unknown",
                emoji: "🤔",
                class: "status-unknown",
            },
        }
    }
}

/// 診断結果の節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Problems,
    Reasons,
    Treatment,
    Tips,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Problems,
        SectionKind::Reasons,
        SectionKind::Treatment,
        SectionKind::Tips,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Problems => "Problems Detected",
            SectionKind::Reasons => "Why We Detected This",
            SectionKind::Treatment => "Treatment & Solutions",
            SectionKind::Tips => "Additional Tips",
        }
    }

    /// 見出し下の補足文
    pub fn lead(&self) -> Option<&'static str> {
        match self {
            SectionKind::Reasons => Some("Visual evidence observed in your plant:"),
            SectionKind::Treatment => Some("Follow these steps in order:"),
            SectionKind::Problems | SectionKind::Tips => None,
        }
    }

    /// 初期状態で開いているか（Tipsのみ閉じる）
    pub fn open_by_default(&self) -> bool {
        !matches!(self, SectionKind::Tips)
    }

    fn index(&self) -> usize {
        match self {
            SectionKind::Problems => 0,
            SectionKind::Reasons => 1,
            SectionKind::Treatment => 2,
            SectionKind::Tips => 3,
        }
    }
}

/// 節の中身
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Bullets(Vec<String>),
    /// 順番に意味がある手順
    Numbered(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

impl Section {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

/// 診断結果の表示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    /// 健康: お祝い表示（ヒントは任意）
    Healthy { tips: Option<String> },
    /// 要対処: 中身のある節だけを並べる
    Diagnosed { sections: Vec<Section> },
}

impl ResultView {
    /// 分岐は `is_healthy` で決める（`status` は見ない）
    pub fn from_result(result: &DiagnosisResult) -> Self {
        if result.is_healthy {
            return ResultView::Healthy {
                tips: non_blank(result.additional_tips.as_deref()),
            };
        }

        let mut sections = Vec::new();
        if !result.problems.is_empty() {
            sections.push(Section {
                kind: SectionKind::Problems,
                body: SectionBody::Bullets(result.problems.clone()),
            });
        }
        if !result.reasons.is_empty() {
            sections.push(Section {
                kind: SectionKind::Reasons,
                body: SectionBody::Bullets(result.reasons.clone()),
            });
        }
        if !result.solutions.is_empty() {
            sections.push(Section {
                kind: SectionKind::Treatment,
                body: SectionBody::Numbered(result.solutions.clone()),
            });
        }
        if let Some(tips) = non_blank(result.additional_tips.as_deref()) {
            sections.push(Section {
                kind: SectionKind::Tips,
                body: SectionBody::Text(tips),
            });
        }

        ResultView::Diagnosed { sections }
    }

    pub fn sections(&self) -> &[Section] {
        match self {
            ResultView::Healthy { .. } => &[],
            ResultView::Diagnosed { sections } => sections,
        }
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections().iter().any(|s| s.kind == kind)
    }
}

/// 見出しカード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHeader {
    pub badge: StatusBadge,
    pub plant_name: Option<String>,
    pub summary: String,
    /// "High confidence" などの表示文
    pub confidence: Option<String>,
}

impl ResultHeader {
    pub fn from_result(result: &DiagnosisResult) -> Self {
        Self {
            badge: StatusBadge::for_status(result.status),
            plant_name: non_blank(result.plant_name.as_deref()),
            summary: result.summary.clone(),
            confidence: non_blank(result.confidence.as_deref())
                .map(|c| format!("{} confidence", c)),
        }
    }
}

/// 節ごとの開閉状態（互いに独立）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionToggles {
    open: [bool; 4],
}

impl SectionToggles {
    pub fn new() -> Self {
        let mut open = [false; 4];
        for kind in SectionKind::ALL {
            open[kind.index()] = kind.open_by_default();
        }
        Self { open }
    }

    pub fn is_open(&self, kind: SectionKind) -> bool {
        self.open[kind.index()]
    }

    pub fn toggle(&mut self, kind: SectionKind) {
        let slot = &mut self.open[kind.index()];
        *slot = !*slot;
    }
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self::new()
    }
}

/// 履歴一覧の表示名（植物名が無ければファイル名）
pub fn history_label(entry: &HistoryEntry) -> &str {
    entry
        .result
        .plant_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&entry.file_name)
}

// =============================================
// 読み込み中表示
// =============================================

/// 読み込み中の段階表示
pub const LOADING_STEPS: &[(&str, &str)] = &[
    ("📤", "Uploading plant photo..."),
    ("🔍", "Scanning for visual symptoms..."),
    ("🌱", "Identifying plant species..."),
    ("🍃", "Analysing leaf patterns..."),
    ("🧬", "Checking for diseases..."),
    ("💊", "Generating treatment plan..."),
    ("✨", "Almost done..."),
];

/// 段階を進める間隔
pub const LOADING_STEP_INTERVAL_MS: u64 = 1200;

/// 経過時間から表示段階を決める（最後の段階で止まる）
pub fn loading_step(elapsed_ms: u64) -> usize {
    let step = (elapsed_ms / LOADING_STEP_INTERVAL_MS) as usize;
    step.min(LOADING_STEPS.len() - 1)
}

/// 進捗バーを出すか（送信中のみ）
pub fn show_progress_bar(percent: u8) -> bool {
    percent > 0 && percent < 100
}

// =============================================
// 接続状態
// =============================================

/// 診断サービスの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Connecting,
    Ready,
    NotConfigured,
}

impl BackendStatus {
    /// ヘルスチェック結果から判定（失敗は未設定扱い）
    pub fn from_probe<E>(probe: &Result<HealthReport, E>) -> Self {
        match probe {
            Ok(report) if report.service_configured() => BackendStatus::Ready,
            _ => BackendStatus::NotConfigured,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BackendStatus::Connecting => "Connecting...",
            BackendStatus::Ready => "AI Ready",
            BackendStatus::NotConfigured => "API Not Configured",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            BackendStatus::Connecting => "backend-connecting",
            BackendStatus::Ready => "backend-ready",
            BackendStatus::NotConfigured => "backend-missing",
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
