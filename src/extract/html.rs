//! `Document` over a parsed HTML snapshot of the webmail page.
//!
//! There is no layout engine here, so visibility is read from markup only:
//! the `hidden` attribute and inline `display`, `visibility` and `opacity`
//! on the element or any ancestor.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::document::{Document, ElementView};

/// Tags whose content never renders as text.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "head", "template", "noscript", "title"];

/// Tags that start a new line in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "tfoot", "thead", "tr", "ul",
];

/// Table cells are separated by a tab, like `innerText`.
const CELL_TAGS: [&str; 2] = ["td", "th"];

/// Parsed page plus optional URL metadata.
pub struct HtmlDocument {
    html: Html,
    url: Option<String>,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Document for HtmlDocument {
    fn query_all(&self, selector: &str) -> Vec<ElementView> {
        let Ok(parsed) = Selector::parse(selector) else {
            debug!(selector, "Ignoring unparseable selector");
            return vec![];
        };
        self.html
            .select(&parsed)
            .map(|el| ElementView::new(inner_text(el), is_visible(el)))
            .collect()
    }

    fn body_text(&self) -> String {
        match Selector::parse("body") {
            Ok(body) => match self.html.select(&body).next() {
                Some(el) => inner_text(el),
                None => inner_text(self.html.root_element()),
            },
            Err(_) => inner_text(self.html.root_element()),
        }
    }

    fn location(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Visible only if neither the element nor any ancestor hides it.
fn is_visible(el: ElementRef<'_>) -> bool {
    if hidden_by_self(el) {
        return false;
    }
    !el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(hidden_by_self)
}

fn hidden_by_self(el: ElementRef<'_>) -> bool {
    let element = el.value();
    if SKIPPED_TAGS.contains(&element.name()) || element.attr("hidden").is_some() {
        return true;
    }
    element.attr("style").is_some_and(style_hides)
}

/// Inline style check for `display:none`, `visibility:hidden` and `opacity:0`.
fn style_hides(style: &str) -> bool {
    style.split(';').any(|decl| {
        let Some((prop, value)) = decl.split_once(':') else {
            return false;
        };
        let value = value.trim().trim_end_matches("!important").trim();
        match prop.trim().to_ascii_lowercase().as_str() {
            "display" => value.eq_ignore_ascii_case("none"),
            "visibility" => value.eq_ignore_ascii_case("hidden"),
            "opacity" => value.parse::<f32>().is_ok_and(|o| o <= 0.0),
            _ => false,
        }
    })
}

/// Approximate `innerText`: visible descendant text with block-level line breaks.
fn inner_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    normalize_lines(&raw)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if hidden_by_self(child_el) {
                continue;
            }
            let name = child_el.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            if CELL_TAGS.contains(&name) {
                out.push('\t');
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child_el, out);
            if block {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            // Source whitespace collapses like in a browser; only tags break lines.
            out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        }
    }
}

fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            line.split('\t')
                .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
