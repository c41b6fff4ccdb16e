use crate::api::HttpBackend;
use crate::config::AppConfig;
use crate::exchange::answer_one_shot;
use crate::session::SessionState;
use crate::types::{HistoryEntry, ResponseMode, ThemeMode};
use crate::views::shared::{COPIED_RESET, Markdown, copy_to_clipboard, format_timestamp};
use dioxus::events::Key;
use dioxus::prelude::*;

/// Payload box, one-shot answer panel and query history.
#[component]
pub fn QueryView(session: Signal<SessionState>, config: AppConfig) -> Element {
    let mut session = session;
    let backend = use_signal(|| HttpBackend::new(config.endpoint.clone()));

    let mut submit = move || {
        let text = session.read().input.clone();
        // claim the request before spawning so a second Enter sees it busy
        let begun = session.with_mut(|s| s.begin_request(&text, ResponseMode::Json));
        let Ok(query) = begun else {
            return;
        };
        let backend = backend.read().clone();
        spawn(async move {
            if let Err(err) = answer_one_shot(session, &backend, &query).await {
                tracing::debug!(error = %err, "query ended without an answer");
            }
        });
    };

    let on_copy = move |_| {
        let text = session.read().response.clone();
        copy_to_clipboard(text);
        session.with_mut(|s| s.mark_copied());
        spawn(async move {
            tokio::time::sleep(COPIED_RESET).await;
            session.with_mut(|s| s.clear_copied());
        });
    };

    let snapshot = session.read().clone();
    let loading = snapshot.loading();
    let theme = snapshot.theme;
    let expanded = snapshot.expanded_history();

    rsx! {
        div { class: "query-row",
            textarea {
                class: "panel payload",
                placeholder: "Enter payload...",
                value: "{snapshot.input}",
                oninput: move |ev| session.with_mut(|s| s.input = ev.value()),
                onkeydown: move |ev| {
                    if ev.key() == Key::Enter && !ev.modifiers().shift() {
                        ev.prevent_default();
                        submit();
                    }
                },
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                disabled: loading,
                onclick: move |_| submit(),
                if loading { "Processing..." } else { "Query" }
            }
            div { class: "response-wrap",
                div { class: "panel response",
                    if snapshot.response.is_empty() {
                        span { class: "placeholder", "Response will appear here..." }
                    } else {
                        Markdown { content: snapshot.response.clone(), theme }
                    }
                }
                if !snapshot.response.is_empty() {
                    button {
                        class: "copy-btn",
                        r#type: "button",
                        title: "Copy response",
                        onclick: on_copy,
                        if snapshot.copied() { "Copied" } else { "Copy" }
                    }
                }
            }
        }

        if let Some(error) = snapshot.error.as_ref() {
            p { class: "error", "{error}" }
        }

        if !snapshot.history().is_empty() {
            div { class: "history",
                h2 { class: "history-title", "Query History" }
                for (index, entry) in snapshot.history().iter().enumerate() {
                    HistoryItem {
                        key: "{index}",
                        session,
                        index,
                        entry: entry.clone(),
                        expanded: expanded == Some(index),
                        theme,
                    }
                }
            }
        }
    }
}

#[component]
fn HistoryItem(
    session: Signal<SessionState>,
    index: usize,
    entry: HistoryEntry,
    expanded: bool,
    theme: ThemeMode,
) -> Element {
    let mut session = session;
    let stamp = format_timestamp(entry.created_at);
    let toggle_title = if expanded { "Collapse" } else { "Expand" };
    rsx! {
        div { class: "history-entry",
            div { class: "history-head",
                p { class: "history-query", "Query: {entry.query}" }
                if let Some(stamp) = stamp {
                    span { class: "history-time", "{stamp}" }
                }
                button {
                    class: "chevron",
                    r#type: "button",
                    title: toggle_title,
                    onclick: move |_| session.with_mut(|s| s.toggle_history(index)),
                    if expanded { "\u{25B2}" } else { "\u{25BC}" }
                }
            }
            if expanded {
                div { class: "history-body",
                    Markdown { content: entry.response.clone(), theme }
                }
            }
        }
    }
}
