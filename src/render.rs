//! 端末表示
//!
//! 表示モデル（ResultView など）を端末向けの文字列にする。
//! 文字列を返すだけで、出力は呼び出し側が行う。

use chrono::{DateTime, Local};
use plant_doctor_common::presentation::{
    history_label, ResultHeader, ResultView, SectionBody, SectionToggles,
};
use plant_doctor_common::{
    BackendStatus, DiagnosisResult, History, MediaKind, SessionEvent,
};
use std::fmt::Write;

/// 診断結果カード
pub fn render_result(result: &DiagnosisResult, toggles: &SectionToggles) -> String {
    let mut out = String::new();
    let header = ResultHeader::from_result(result);

    let _ = write!(out, "{}", header.badge.label);
    if let Some(confidence) = &header.confidence {
        let _ = write!(out, "  ({})", confidence);
    }
    out.push('\n');

    if let Some(name) = &header.plant_name {
        let _ = writeln!(out, "{} {}", header.badge.emoji, name);
    }
    if !header.summary.is_empty() {
        let _ = writeln!(out, "{}", header.summary);
    }

    match ResultView::from_result(result) {
        ResultView::Healthy { tips } => {
            out.push('\n');
            let _ = writeln!(out, "🎉 Your plant is thriving!");
            let _ = writeln!(
                out,
                "No diseases or issues were detected. Keep up the great plant care!"
            );
            if let Some(tips) = tips {
                let _ = writeln!(out, "💡 {}", tips);
            }
        }
        ResultView::Diagnosed { sections } => {
            for section in &sections {
                out.push('\n');
                if !toggles.is_open(section.kind) {
                    let _ = writeln!(out, "▸ {}", section.title());
                    continue;
                }

                let _ = writeln!(out, "▾ {}", section.title());
                if let Some(lead) = section.kind.lead() {
                    let _ = writeln!(out, "  {}", lead);
                }
                match &section.body {
                    SectionBody::Bullets(items) => {
                        for item in items {
                            let _ = writeln!(out, "  • {}", item);
                        }
                    }
                    SectionBody::Numbered(items) => {
                        for (i, item) in items.iter().enumerate() {
                            let _ = writeln!(out, "  {}. {}", i + 1, item);
                        }
                    }
                    SectionBody::Text(text) => {
                        let _ = writeln!(out, "  {}", text);
                    }
                }
            }
        }
    }

    out
}

/// 履歴一覧（新しい順）
pub fn render_history(history: &History) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut out = String::from("🕘 Recent Analyses\n");
    for entry in history.iter() {
        let icon = match entry.media_kind {
            MediaKind::Image => "🖼️",
            MediaKind::Video => "🎥",
        };
        let _ = writeln!(
            out,
            "  [{}] {} {}  {}  {}",
            entry.id,
            icon,
            history_label(entry),
            format_time(entry.timestamp_ms),
            entry.result.status.as_str(),
        );
    }
    out
}

/// 通知（トースト相当）
pub fn render_notification(event: &SessionEvent) -> String {
    let mark = if event.is_positive() { "✔" } else { "✖" };
    format!("{} {}", mark, event.notification())
}

pub fn render_backend_status(status: BackendStatus) -> String {
    let mark = match status {
        BackendStatus::Connecting => "…",
        BackendStatus::Ready => "●",
        BackendStatus::NotConfigured => "○",
    };
    format!("{} {}", mark, status.label())
}

/// ミリ秒時刻をローカルの HH:MM に
pub fn format_time(timestamp_ms: u64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}
