//! Reply formatting: plain text → paragraph containers.

use std::sync::LazyLock;

use regex::Regex;

/// Opening tag of a paragraph container.
pub const PARAGRAPH_OPEN: &str = r#"<div style="margin-bottom: 12px;">"#;
pub const PARAGRAPH_CLOSE: &str = "</div>";

/// Any `<div …>`, `<p …>` or `<br>` counts as existing paragraph markup.
static PARAGRAPH_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:div|p)[\s>]|<br\s*/?>").unwrap());
static EXCESS_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Wrap one paragraph in a container.
pub fn paragraph(text: &str) -> String {
    format!("{PARAGRAPH_OPEN}{text}{PARAGRAPH_CLOSE}")
}

pub fn has_paragraph_markup(text: &str) -> bool {
    PARAGRAPH_MARKUP.is_match(text)
}

/// Convert plain text to paragraph markup. Idempotent: text that already
/// contains paragraph markup is returned unchanged.
pub fn format_reply(text: &str) -> String {
    if has_paragraph_markup(text) {
        return text.to_string();
    }

    let text = text.replace("\r\n", "\n");
    let collapsed = EXCESS_BREAKS.replace_all(&text, "\n\n");

    collapsed
        .split('\n')
        .filter(|unit| !unit.trim().is_empty())
        .map(paragraph)
        .collect()
}
