//! 解析中表示コンポーネント

use std::time::Duration;

use leptos::prelude::*;
use plant_doctor_common::presentation::{
    loading_step, show_progress_bar, LOADING_STEPS, LOADING_STEP_INTERVAL_MS,
};

#[component]
pub fn LoadingPlant(#[prop(into)] progress: Signal<u8>) -> impl IntoView {
    let (elapsed_ms, set_elapsed_ms) = signal(0u64);

    if let Ok(handle) = set_interval_with_handle(
        move || set_elapsed_ms.update(|ms| *ms += LOADING_STEP_INTERVAL_MS),
        Duration::from_millis(LOADING_STEP_INTERVAL_MS),
    ) {
        on_cleanup(move || handle.clear());
    }

    let step = move || loading_step(elapsed_ms.get());

    view! {
        <div class="loading-plant">
            <div class="loading-icon">{move || LOADING_STEPS[step()].0}</div>
            <p class="loading-label">{move || LOADING_STEPS[step()].1}</p>

            <ul class="loading-steps">
                {LOADING_STEPS
                    .iter()
                    .enumerate()
                    .map(|(i, (emoji, label))| {
                        view! {
                            <li
                                class:done=move || i < step()
                                class:active=move || i == step()
                            >
                                <span>{*emoji}</span>
                                " "
                                {*label}
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>

            <Show when=move || show_progress_bar(progress.get())>
                <div class="progress-bar">
                    <div
                        class="progress-fill"
                        style=move || format!("width: {}%", progress.get())
                    />
                </div>
                <p class="progress-text">{move || format!("Uploading... {}%", progress.get())}</p>
            </Show>
        </div>
    }
}
