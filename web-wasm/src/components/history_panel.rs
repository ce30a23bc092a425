//! 解析履歴パネルコンポーネント

use leptos::prelude::*;
use plant_doctor_common::presentation::{history_label, StatusBadge};
use plant_doctor_common::{HistoryEntry, MediaKind};
use wasm_bindgen::JsValue;

/// 履歴1件の表示内容
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub id: u64,
    pub label: String,
    pub preview_url: String,
    pub is_video: bool,
    pub time: String,
    pub badge: StatusBadge,
}

impl HistoryItem {
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            label: history_label(entry).to_string(),
            preview_url: entry.preview.url().to_string(),
            is_video: entry.media_kind == MediaKind::Video,
            time: format_clock(entry.timestamp_ms),
            badge: StatusBadge::for_status(entry.result.status),
        }
    }
}

/// ローカル時刻の HH:MM
fn format_clock(timestamp_ms: u64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(timestamp_ms as f64));
    format!("{:02}:{:02}", date.get_hours(), date.get_minutes())
}

#[component]
pub fn HistoryPanel<FS, FC>(
    #[prop(into)] items: Signal<Vec<HistoryItem>>,
    #[prop(into)] selected: Signal<Option<u64>>,
    #[prop(into)] disabled: Signal<bool>,
    on_select: FS,
    on_clear: FC,
) -> impl IntoView
where
    FS: Fn(u64) + 'static + Clone + Send + Sync,
    FC: Fn(()) + 'static + Clone,
{
    view! {
        <aside class="history-panel">
            <div class="history-header">
                <h3>"🕘 Recent Analyses"</h3>
                <button
                    class="btn btn-tertiary btn-small"
                    prop:disabled=move || disabled.get()
                    on:click=move |_| on_clear(())
                >
                    "Clear"
                </button>
            </div>
            <ul class="history-list">
                <For
                    each=move || items.get()
                    key=|item| item.id
                    children=move |item| {
                        let on_select = on_select.clone();
                        let id = item.id;
                        view! {
                            <li
                                class="history-item"
                                class:selected=move || selected.get() == Some(id)
                                on:click=move |_| {
                                    if !disabled.get_untracked() {
                                        on_select(id);
                                    }
                                }
                            >
                                {if item.is_video {
                                    view! { <div class="history-thumb video">"🎥"</div> }.into_any()
                                } else {
                                    view! {
                                        <img class="history-thumb" src=item.preview_url alt=item.label.clone() />
                                    }
                                    .into_any()
                                }}
                                <div class="history-meta">
                                    <span class="history-label">{item.label}</span>
                                    <span class="text-muted">{item.time}</span>
                                </div>
                                <span class=format!("history-status {}", item.badge.class)>
                                    {item.badge.emoji}
                                </span>
                            </li>
                        }
                    }
                />
            </ul>
        </aside>
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use plant_doctor_common::{DiagnosisResult, HealthStatus, Preview};
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn test_history_item_from_entry() {
        let entry = HistoryEntry {
            id: 7,
            file_name: "clip.webm".to_string(),
            media_kind: MediaKind::Video,
            preview: Preview::unmanaged("blob:7"),
            result: DiagnosisResult {
                status: HealthStatus::Diseased,
                ..Default::default()
            },
            timestamp_ms: 1_700_000_000_000,
        };

        let item = HistoryItem::from_entry(&entry);
        assert_eq!(item.id, 7);
        assert_eq!(item.label, "clip.webm");
        assert!(item.is_video);
        assert_eq!(item.time.len(), 5);
        assert_eq!(item.badge.class, "status-diseased");
    }
}
