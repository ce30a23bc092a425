//! アップロード欄コンポーネント
//!
//! ドロップまたはファイル選択で受け取ったファイルをそのまま親へ渡す。
//! 検査は親側（UploadSurface）で行う。

use leptos::html::Input;
use leptos::prelude::*;
use plant_doctor_common::upload::accept_attribute;
use web_sys::{DragEvent, File, FileList};

#[component]
pub fn UploadZone<F>(#[prop(into)] disabled: Signal<bool>, on_files: F) -> impl IntoView
where
    F: Fn(Vec<File>) + 'static + Clone,
{
    let (is_dragover, set_is_dragover) = signal(false);
    let input_ref: NodeRef<Input> = NodeRef::new();

    let on_drop = {
        let on_files = on_files.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);

            if disabled.get_untracked() {
                return;
            }

            if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
                on_files(to_vec(&files));
            }
        }
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        if !disabled.get_untracked() {
            set_is_dragover.set(true);
        }
    };

    let on_dragleave = move |_: DragEvent| {
        set_is_dragover.set(false);
    };

    let on_click = move |_| {
        if disabled.get_untracked() {
            return;
        }
        if let Some(input) = input_ref.get() {
            input.click();
        }
    };

    let on_change = move |_| {
        let Some(input) = input_ref.get() else {
            return;
        };
        if let Some(files) = input.files() {
            on_files(to_vec(&files));
        }
        // 同じファイルを選び直しても change が発火するように
        input.set_value("");
    };

    view! {
        <div
            class=move || {
                let mut classes = vec!["upload-zone"];
                if is_dragover.get() {
                    classes.push("dragover");
                }
                if disabled.get() {
                    classes.push("disabled");
                }
                classes.join(" ")
            }
            on:drop=on_drop
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <div class="upload-icon">{move || if is_dragover.get() { "🌱" } else { "📷" }}</div>
            <p>"Drop a plant photo or video here, or click to choose"</p>
            <p class="text-muted">"JPEG, PNG, WebP, GIF, MP4, MOV, AVI, WebM · up to 20MB"</p>
        </div>
        <input
            type="file"
            class="hidden"
            accept=accept_attribute()
            node_ref=input_ref
            prop:disabled=move || disabled.get()
            on:change=on_change
        />
    }
}

fn to_vec(files: &FileList) -> Vec<File> {
    (0..files.length()).filter_map(|i| files.get(i)).collect()
}
