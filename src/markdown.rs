use crate::types::ThemeMode;
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    // render.unsafe_ stays off: raw HTML from the service is never passed through
    options
});

static DARK_HIGHLIGHTER: Lazy<SyntectAdapter> =
    Lazy::new(|| SyntectAdapter::new(Some("base16-ocean.dark")));
static LIGHT_HIGHLIGHTER: Lazy<SyntectAdapter> =
    Lazy::new(|| SyntectAdapter::new(Some("InspiredGitHub")));

/// Render GitHub-flavoured Markdown with highlighted code fences.
pub fn to_html(md: &str, theme: ThemeMode) -> String {
    let adapter: &SyntectAdapter = match theme {
        ThemeMode::Dark => &DARK_HIGHLIGHTER,
        ThemeMode::Light => &LIGHT_HIGHLIGHTER,
    };
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}
