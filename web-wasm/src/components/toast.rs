//! 通知コンポーネント

use leptos::prelude::*;
use plant_doctor_common::SessionEvent;

/// 表示中の通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub positive: bool,
}

impl Toast {
    pub fn from_event(event: &SessionEvent) -> Self {
        Self {
            id: 0,
            message: event.notification(),
            positive: event.is_positive(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            id: 0,
            message: message.into(),
            positive: false,
        }
    }

    /// 表示順の番号を付ける（古い通知の自動消去と区別するため）
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }
}

/// 通知の表示時間
pub const TOAST_DURATION_MS: u32 = 4000;

#[component]
pub fn ToastView(toast: ReadSignal<Option<Toast>>) -> impl IntoView {
    move || {
        toast.get().map(|t| {
            view! {
                <div class="toast" class:toast-success=t.positive class:toast-error=!t.positive>
                    {t.message}
                </div>
            }
        })
    }
}
