use crate::storage::KvStore;
use crate::types::ThemeMode;
use std::io;

/// Storage key of the persisted dark-mode flag.
pub const DARK_MODE_KEY: &str = "darkMode";

pub struct ThemeDefinition {
    pub css: &'static str,
    pub toggle_icon: &'static str,
    pub toggle_label: &'static str,
}

pub fn theme_definition(mode: ThemeMode) -> ThemeDefinition {
    match mode {
        ThemeMode::Dark => ThemeDefinition {
            css: DARK_THEME,
            toggle_icon: "\u{2600}",
            toggle_label: "Switch to light mode",
        },
        ThemeMode::Light => ThemeDefinition {
            css: LIGHT_THEME,
            toggle_icon: "\u{263E}",
            toggle_label: "Switch to dark mode",
        },
    }
}

/// Read the stored flag. Anything but `"true"` is light mode.
pub fn load_theme(store: &KvStore) -> ThemeMode {
    let dark = store
        .get(DARK_MODE_KEY)
        .is_some_and(|raw| raw.trim() == "true");
    ThemeMode::from_dark_flag(dark)
}

pub fn save_theme(store: &KvStore, mode: ThemeMode) -> io::Result<()> {
    let value = if mode.is_dark() { "true" } else { "false" };
    store.set(DARK_MODE_KEY, value)
}

/// Flip `current`, persist the result and return it.
///
/// The new mode is returned even if the write fails; the error is logged.
pub fn toggle_theme(store: &KvStore, current: ThemeMode) -> ThemeMode {
    let next = current.toggled();
    if let Err(err) = save_theme(store, next) {
        tracing::warn!(error = %err, "could not persist theme preference");
    }
    next
}

const DARK_THEME: &str = r#"
:root {
    --color-bg-primary: #111827;
    --color-bg-secondary: #1f2937;
    --color-bg-muted: #374151;
    --color-text-primary: #ffffff;
    --color-text-muted: #9ca3af;
    --color-border: #4b5563;
    --color-input-bg: #1f2937;
    --color-accent: #3b82f6;
    --color-accent-hover: #2563eb;
    --color-accent-disabled: #6b7280;
    --color-query: #60a5fa;
    --color-error: #f87171;
    --color-chat-user-bg: #3b82f6;
    --color-chat-user-text: #ffffff;
    --color-chat-assistant-bg: #1f2937;
    --color-chat-assistant-text: #f9fafb;
    --color-toggle: #facc15;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.panel { background: var(--color-input-bg); border-color: var(--color-border); }
.history-entry { background: var(--color-bg-secondary); border-color: var(--color-border); }
.history-body { background: var(--color-bg-muted); }
.md code, .md pre { background: #0b1220; }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #f9fafb;
    --color-bg-secondary: #f3f4f6;
    --color-bg-muted: #e5e7eb;
    --color-text-primary: #111827;
    --color-text-muted: #4b5563;
    --color-border: #d1d5db;
    --color-input-bg: #ffffff;
    --color-accent: #3b82f6;
    --color-accent-hover: #2563eb;
    --color-accent-disabled: #9ca3af;
    --color-query: #2563eb;
    --color-error: #ef4444;
    --color-chat-user-bg: #2563eb;
    --color-chat-user-text: #ffffff;
    --color-chat-assistant-bg: #ffffff;
    --color-chat-assistant-text: #111827;
    --color-toggle: #2563eb;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.panel { background: var(--color-input-bg); border-color: var(--color-border); }
.history-entry { background: var(--color-bg-secondary); border-color: var(--color-border); }
.history-body { background: var(--color-bg-muted); }
.md code, .md pre { background: #f3f4f6; }
"#;
