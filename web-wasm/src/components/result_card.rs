//! 診断結果カードコンポーネント
//!
//! 健康なら祝福表示、そうでなければ中身のある節だけを開閉式で並べる。
//! 開閉状態は節ごとに独立で、カードごとに初期化される。

use leptos::prelude::*;
use plant_doctor_common::presentation::{
    ResultHeader, ResultView, Section, SectionBody, SectionToggles,
};
use plant_doctor_common::DiagnosisResult;

#[component]
pub fn ResultCard(result: DiagnosisResult) -> impl IntoView {
    let header = ResultHeader::from_result(&result);
    let view_model = ResultView::from_result(&result);
    let toggles = RwSignal::new(SectionToggles::new());

    let body = match view_model {
        ResultView::Healthy { tips } => view! {
            <div class="healthy-panel">
                <div class="healthy-icon">"🎉"</div>
                <h3>"Your plant is thriving!"</h3>
                <p>"No diseases or issues were detected. Keep up the great plant care!"</p>
                {tips.map(|tips| view! { <p class="healthy-tip">"💡 " {tips}</p> })}
            </div>
        }
        .into_any(),
        ResultView::Diagnosed { sections } => view! {
            <div class="result-sections">
                {sections
                    .into_iter()
                    .map(|section| view! { <CollapsibleSection section=section toggles=toggles /> })
                    .collect_view()}
            </div>
        }
        .into_any(),
    };

    view! {
        <div class="result-card">
            <div class=format!("result-header {}", header.badge.class)>
                <span class="status-badge">{header.badge.label}</span>
                {header
                    .confidence
                    .map(|c| view! { <span class="confidence">{c}</span> })}
                {header
                    .plant_name
                    .map(|name| view! {
                        <h2 class="plant-name">{header.badge.emoji} " " {name}</h2>
                    })}
                <p class="summary">{header.summary}</p>
            </div>
            {body}
        </div>
    }
}

#[component]
fn CollapsibleSection(section: Section, toggles: RwSignal<SectionToggles>) -> impl IntoView {
    let kind = section.kind;
    let is_open = move || toggles.with(|t| t.is_open(kind));

    let content = match section.body {
        SectionBody::Bullets(items) => view! {
            <ul>{items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}</ul>
        }
        .into_any(),
        SectionBody::Numbered(items) => view! {
            <ol class="numbered-list">
                {items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| view! {
                        <li>
                            <span class="step-number">{i + 1}</span>
                            <span>{item}</span>
                        </li>
                    })
                    .collect_view()}
            </ol>
        }
        .into_any(),
        SectionBody::Text(text) => view! { <p>{text}</p> }.into_any(),
    };

    view! {
        <section class="result-section" class:open=is_open>
            <button
                class="section-toggle"
                on:click=move |_| toggles.update(|t| t.toggle(kind))
            >
                <span>{kind.title()}</span>
                <span class="chevron">{move || if is_open() { "▾" } else { "▸" }}</span>
            </button>
            <div class="section-body" class:hidden=move || !is_open()>
                {kind.lead().map(|lead| view! { <p class="section-lead">{lead}</p> })}
                {content}
            </div>
        </section>
    }
}
