use crate::markdown;
use crate::types::ThemeMode;
use dioxus::prelude::*;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

/// How long the "Copied" state stays on a copy button.
pub const COPIED_RESET: Duration = Duration::from_millis(1500);

const ENTRY_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

pub fn format_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(ENTRY_TIME_FORMAT).ok()
}

pub fn copy_to_clipboard(text: String) {
    #[cfg(any(feature = "desktop", feature = "mobile"))]
    {
        let copied = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text));
        if let Err(err) = copied {
            tracing::warn!(error = %err, "clipboard write failed");
        }
    }
    #[cfg(not(any(feature = "desktop", feature = "mobile")))]
    {
        let _ = text;
        tracing::debug!("no clipboard on this platform");
    }
}

#[component]
pub fn Markdown(content: String, theme: ThemeMode) -> Element {
    let html = markdown::to_html(&content, theme);
    rsx! {
        div { class: "md", dangerous_inner_html: "{html}" }
    }
}
