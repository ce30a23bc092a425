//! メインアプリケーションコンポーネント
//!
//! 解析セッションを1つのシグナルに置き、画面は状態（待機/解析中/成功/失敗）に
//! 応じて切り替える。通信は段階API（begin → report_progress → complete）で進める。

use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use plant_doctor_common::{
    AnalysisSession, BackendStatus, DiagnosisService, FileMeta, MediaKind, Preview,
    SessionStatus, UploadDecision, UploadSurface,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, Url};

use crate::api::BrowserDiagnosisClient;
use crate::components::{
    header::Header,
    history_panel::{HistoryItem, HistoryPanel},
    loading_plant::LoadingPlant,
    result_card::ResultCard,
    toast::{Toast, ToastView, TOAST_DURATION_MS},
    upload_zone::UploadZone,
};

/// Object URLのプレビューを作る（最後の参照が消えたら破棄）
fn object_url_preview(file: &File) -> Result<Preview, JsValue> {
    let url = Url::create_object_url_with_blob(file)?;
    Ok(Preview::new(url, |url| {
        let _ = Url::revoke_object_url(url);
    }))
}

fn file_meta(file: &File) -> FileMeta {
    FileMeta::new(file.name(), file.type_(), file.size() as u64)
}

#[component]
pub fn App() -> impl IntoView {
    let session = RwSignal::new(AnalysisSession::new());
    let (backend, set_backend) = signal(BackendStatus::default());
    let (toast, set_toast) = signal(None::<Toast>);
    let (selected, set_selected) = signal(None::<u64>);
    let toast_seq = StoredValue::new(0u64);
    let surface = UploadSurface::new();
    let client = BrowserDiagnosisClient::from_build_env();

    // 接続確認
    {
        let client = client.clone();
        spawn_local(async move {
            let probe = client.check_health().await;
            if let Err(e) = &probe {
                gloo::console::warn!(format!("health check failed: {}", e));
            }
            set_backend.set(BackendStatus::from_probe(&probe));
        });
    }

    let notify = move |toast: Toast| {
        toast_seq.update_value(|n| *n += 1);
        let id = toast_seq.get_value();
        set_toast.set(Some(toast.with_id(id)));

        Timeout::new(TOAST_DURATION_MS, move || {
            set_toast.update(|current| {
                if current.as_ref().is_some_and(|t| t.id == id) {
                    *current = None;
                }
            });
        })
        .forget();
    };

    // 画面状態（値が変わった時だけ描き直す）
    let status = Memo::new(move |_| session.with(|s| s.status()));
    let busy = Memo::new(move |_| session.with(|s| s.is_busy()));
    let progress = Memo::new(move |_| session.with(|s| s.progress()));
    let result = Memo::new(move |_| session.with(|s| s.result().cloned()));
    let error = Memo::new(move |_| session.with(|s| s.error().map(str::to_string)));
    let preview = Memo::new(move |_| {
        session.with(|s| {
            s.preview().map(|p| {
                (
                    p.url().to_string(),
                    s.media_kind() == Some(MediaKind::Video),
                )
            })
        })
    });
    let history_items = Memo::new(move |_| {
        session.with(|s| {
            s.history()
                .iter()
                .map(HistoryItem::from_entry)
                .collect::<Vec<_>>()
        })
    });

    let on_files = move |files: Vec<File>| {
        let metas: Vec<FileMeta> = files.iter().map(file_meta).collect();
        let meta = match surface.offer(&metas, session.with_untracked(|s| s.is_busy())) {
            UploadDecision::Accepted(meta, _) => meta,
            UploadDecision::Rejected(reason) => {
                notify(Toast::error(reason.to_string()));
                return;
            }
            UploadDecision::Ignored => return,
        };
        let Some(file) = files.into_iter().next() else {
            return;
        };

        let preview = match object_url_preview(&file) {
            Ok(preview) => preview,
            Err(_) => {
                notify(Toast::error("Could not preview this file"));
                return;
            }
        };

        let submission = match session.try_update(|s| s.begin(meta, preview)) {
            Some(Ok(submission)) => submission,
            Some(Err(e)) => {
                notify(Toast::error(e.user_message()));
                return;
            }
            None => return,
        };
        set_selected.set(None);

        let client = client.clone();
        spawn_local(async move {
            let outcome = client
                .analyse(&submission.file, &file, submission.kind, &|percent| {
                    session.update(|s| s.report_progress(percent))
                })
                .await;

            let now_ms = js_sys::Date::now() as u64;
            if let Some(event) = session.try_update(|s| s.complete(outcome, now_ms)).flatten() {
                notify(Toast::from_event(&event));
            }
        });
    };

    let on_reset = move |_| {
        session.update(|s| {
            s.reset();
        });
        set_selected.set(None);
    };

    let on_select = move |id: u64| {
        if session.try_update(|s| s.select_history(id)) == Some(true) {
            set_selected.set(Some(id));
        }
    };

    let on_clear = move |_: ()| {
        session.update(|s| s.clear_history());
        set_selected.set(None);
    };

    let preview_view = move || {
        preview.get().map(|(url, is_video)| {
            if is_video {
                view! { <video class="preview-media" src=url controls=true /> }.into_any()
            } else {
                view! { <img class="preview-media" src=url alt="Plant preview" /> }.into_any()
            }
        })
    };

    view! {
        <div class="container">
            <Header backend=backend />

            <main class="layout">
                <section class="workspace">
                    {move || match status.get() {
                        SessionStatus::Idle => view! {
                            <UploadZone disabled=busy on_files=on_files.clone() />
                        }
                        .into_any(),
                        SessionStatus::Submitting => view! {
                            <div class="preview">{preview_view}</div>
                            <LoadingPlant progress=progress />
                        }
                        .into_any(),
                        SessionStatus::Success => view! {
                            <div class="preview">{preview_view}</div>
                            {move || result.get().map(|result| view! { <ResultCard result=result /> })}
                            <button class="btn btn-primary" on:click=on_reset>
                                "🔄 New Analysis"
                            </button>
                        }
                        .into_any(),
                        SessionStatus::Failure => view! {
                            <div class="preview">{preview_view}</div>
                            <div class="error-panel">
                                <h3>"❌ Analysis Failed"</h3>
                                <p>{move || error.get().unwrap_or_default()}</p>
                                <button class="btn btn-secondary" on:click=on_reset>
                                    "Try Again"
                                </button>
                            </div>
                        }
                        .into_any(),
                    }}
                </section>

                <Show when=move || !history_items.get().is_empty()>
                    <HistoryPanel
                        items=history_items
                        selected=selected
                        disabled=busy
                        on_select=on_select
                        on_clear=on_clear
                    />
                </Show>
            </main>

            <ToastView toast=toast />
        </div>
    }
}
