use crate::config::AppConfig;
use crate::exchange::SessionHandle;
use crate::session::SessionState;
use crate::storage::KvStore;
use crate::theme::{load_theme, theme_definition, toggle_theme};
use crate::types::{ResponseMode, ThemeMode};
use crate::views::{ChatView, QueryView};
use dioxus::prelude::*;
use once_cell::sync::OnceCell;

const MAIN_CSS: Asset = asset!("/assets/main.css");

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Start the desktop/web app with `config`.
pub fn launch(config: AppConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("configuration was already set, keeping the first one");
    }
    dioxus::launch(App);
}

fn app_config() -> AppConfig {
    CONFIG.get().cloned().unwrap_or_default()
}

impl SessionHandle for Signal<SessionState> {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.with_mut(f)
    }
}

#[component]
pub fn App() -> Element {
    let config = use_hook(app_config);
    let store = use_hook(|| KvStore::open_default(config.data_dir.as_deref()));
    let initial_theme = use_hook(|| load_theme(&store));
    let session = use_signal(|| SessionState::new(initial_theme));
    let theme = session.read().theme;

    let body = match config.response_mode {
        ResponseMode::Json => rsx! { QueryView { session, config: config.clone() } },
        ResponseMode::Stream => rsx! { ChatView { session, config: config.clone() } },
    };

    rsx! {
        ThemeStyles { theme }
        div { class: "page",
            AppHeader { session, store }
            {body}
            AppFooter {}
        }
    }
}

#[component]
fn ThemeStyles(theme: ThemeMode) -> Element {
    let definition = theme_definition(theme);
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        style { dangerous_inner_html: "{definition.css}" }
    }
}

#[component]
fn AppHeader(session: Signal<SessionState>, store: KvStore) -> Element {
    let mut session = session;
    let definition = theme_definition(session.read().theme);
    rsx! {
        div { class: "header",
            h1 { class: "title", "AI Agent" }
            button {
                class: "theme-toggle",
                r#type: "button",
                title: definition.toggle_label,
                onclick: move |_| {
                    let current = session.read().theme;
                    let next = toggle_theme(&store, current);
                    session.with_mut(|s| s.theme = next);
                },
                "{definition.toggle_icon}"
            }
        }
    }
}

#[component]
fn AppFooter() -> Element {
    rsx! {
        footer { class: "footer",
            p { "Powered by Dioxus & Rust" }
        }
    }
}
