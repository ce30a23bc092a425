//! ヘッダーコンポーネント

use leptos::prelude::*;
use plant_doctor_common::BackendStatus;

#[component]
pub fn Header(backend: ReadSignal<BackendStatus>) -> impl IntoView {
    view! {
        <header class="header">
            <div class="brand">
                <span class="brand-icon">"🌿"</span>
                <div>
                    <h1>"Plant Doctor"</h1>
                    <p class="text-muted">"AI-powered plant disease diagnosis"</p>
                </div>
            </div>
            <span class=move || format!("backend-status {}", backend.get().class())>
                {move || backend.get().label()}
            </span>
        </header>
    }
}
