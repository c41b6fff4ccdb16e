use crate::api::HttpBackend;
use crate::config::AppConfig;
use crate::exchange::{StreamOptions, stream_response};
use crate::session::{RequestState, SessionState};
use crate::types::{ResponseMode, Role, ThemeMode};
use crate::views::shared::{COPIED_RESET, Markdown, copy_to_clipboard};
use dioxus::events::Key;
use dioxus::prelude::*;
use tokio_util::sync::CancellationToken;

const AT_BOTTOM_JS: &str = r#"
const el = document.getElementById("chat-list");
dioxus.send(!el || el.scrollHeight - el.scrollTop - el.clientHeight < 48);
"#;

const SCROLL_TO_BOTTOM_JS: &str = r#"
const el = document.getElementById("chat-list");
if (el) { el.scrollTop = el.scrollHeight; }
"#;

/// Streaming conversation: user bubbles on the right, the growing answer on the left.
#[component]
pub fn ChatView(session: Signal<SessionState>, config: AppConfig) -> Element {
    let mut session = session;
    let backend = use_signal(|| HttpBackend::new(config.endpoint.clone()));
    let options = use_signal(|| StreamOptions::from(&config));
    let mut cancel = use_signal(|| Option::<CancellationToken>::None);

    let scroll_epoch = use_memo(move || session.read().scroll_epoch());
    use_effect(move || {
        let _ = scroll_epoch();
        if session.peek().follow_output() {
            let _ = document::eval(SCROLL_TO_BOTTOM_JS);
        }
    });

    let mut send_message = move || {
        let text = session.read().input.clone();
        let begun = session.with_mut(|s| s.begin_request(&text, ResponseMode::Stream));
        let Ok(query) = begun else {
            return;
        };
        let token = CancellationToken::new();
        cancel.set(Some(token.clone()));
        let backend = backend.read().clone();
        let options = options.read().clone();
        spawn(async move {
            if let Err(err) = stream_response(session, &backend, &query, &options, token).await {
                tracing::debug!(error = %err, "stream ended early");
            }
            cancel.set(None);
        });
    };

    let stop = move |_| {
        if let Some(token) = cancel.read().as_ref() {
            token.cancel();
        }
    };

    let on_scroll = move |_| {
        spawn(async move {
            let mut check = document::eval(AT_BOTTOM_JS);
            match check.recv::<bool>().await {
                Ok(at_bottom) => session.with_mut(|s| s.set_follow_output(at_bottom)),
                Err(err) => tracing::debug!(error = ?err, "scroll position check failed"),
            }
        });
    };

    let snapshot = session.read().clone();
    let state = snapshot.state();
    let loading = snapshot.loading();
    let theme = snapshot.theme;
    let last = snapshot.messages().len().saturating_sub(1);
    let waiting = state == RequestState::Sending;

    rsx! {
        div { class: "chat-wrap",
            div { id: "chat-list", class: "chat-list", onscroll: on_scroll,
                for (i, msg) in snapshot.messages().iter().enumerate() {
                    if matches!(msg.role, Role::User) {
                        div { key: "{i}", class: "message-row user",
                            div { class: "bubble user", "{msg.content}" }
                        }
                    } else {
                        div { key: "{i}", class: "message-row assistant",
                            div { class: "avatar assistant", "AI" }
                            div { class: "bubble assistant",
                                AssistantBubble {
                                    content: msg.content.clone(),
                                    streaming: state == RequestState::Streaming && i == last,
                                    theme,
                                }
                            }
                        }
                    }
                }
                if waiting {
                    div { class: "message-row assistant",
                        div { class: "avatar assistant", "AI" }
                        div { class: "shimmer-line",
                            span { class: "shimmer-text", "Processing…" }
                        }
                    }
                }
            }

            if let Some(error) = snapshot.error.as_ref() {
                p { class: "error", "{error}" }
            }

            div { class: "composer",
                textarea {
                    rows: "2",
                    placeholder: "Enter payload...",
                    value: "{snapshot.input}",
                    disabled: loading,
                    autofocus: true,
                    oninput: move |ev| session.with_mut(|s| s.input = ev.value()),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter && !ev.modifiers().shift() {
                            ev.prevent_default();
                            send_message();
                        }
                    },
                }
                if loading {
                    button {
                        class: "btn",
                        r#type: "button",
                        title: "Stop",
                        onclick: stop,
                        "Stop"
                    }
                } else {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| send_message(),
                        "Send"
                    }
                }
                button {
                    class: "btn",
                    r#type: "button",
                    disabled: loading,
                    onclick: move |_| session.with_mut(|s| s.clear_conversation()),
                    "New chat"
                }
            }
        }
    }
}

#[component]
fn AssistantBubble(content: String, streaming: bool, theme: ThemeMode) -> Element {
    let mut copied = use_signal(|| false);
    let copy_payload = content.clone();
    let on_copy = move |_| {
        copy_to_clipboard(copy_payload.clone());
        copied.set(true);
        spawn(async move {
            tokio::time::sleep(COPIED_RESET).await;
            copied.set(false);
        });
    };

    rsx! {
        if !streaming && !content.is_empty() {
            div { class: "bubble-controls",
                button {
                    class: "action-btn",
                    r#type: "button",
                    title: "Copy markdown",
                    onclick: on_copy,
                    if copied() { "Copied" } else { "Copy" }
                }
            }
        }
        if streaming && content.is_empty() {
            div { class: "md", span { class: "shimmer-text", "Processing…" } }
        } else {
            Markdown { content: content.clone(), theme }
        }
    }
}
