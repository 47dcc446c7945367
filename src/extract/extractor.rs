//! Content extraction cascade.
//!
//! Strategies, most specific first; the first one that yields text wins:
//! 1. content selectors, longest qualifying text across *all* of them
//! 2. longest visible element on the page
//! 3. quoted reply block
//! 4. pre-existing text in the compose box
//! 5. subject/sender composite
//! 6. placeholder in the page's language
//!
//! Step 1 prefers more text over a more specific selector, so a long
//! disclaimer matched by a broad selector can beat the real body.

use tracing::{debug, info, warn};

use crate::language::{LanguageCode, classify, has_japanese_context};
use crate::pipeline::types::{ContentSource, ExtractionResult};

use super::document::Document;

/// A content-container selector with its minimum text length (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentQuery {
    pub selector: &'static str,
    pub min_chars: usize,
}

const fn query(selector: &'static str) -> ContentQuery {
    ContentQuery {
        selector,
        min_chars: MIN_SELECTOR_CHARS,
    }
}

/// Shorter matches are treated as fragments (labels, buttons, dates).
pub const MIN_SELECTOR_CHARS: usize = 30;
/// Floor for the generic visible-element scan.
pub const MIN_GENERIC_CHARS: usize = 50;
/// Compose-box text must exceed this to count as quoted content.
pub const MIN_COMPOSE_CHARS: usize = 20;
/// Anything shorter at the end of the cascade is replaced by the placeholder.
pub const MIN_USABLE_CHARS: usize = 20;

/// Thread body containers, most specific first.
pub const DEFAULT_CONTENT_QUERIES: [ContentQuery; 15] = [
    query(".adn .a3s"),
    query(".h7 .ii"),
    query(r#".ii[dir="ltr"]"#),
    query(r#".ii[dir="rtl"]"#),
    query(".gs .ii"),
    query(".g2"),
    query(r#".ii[lang="ja"]"#),
    query(r#".ii[lang="zh"]"#),
    query("[data-thread-perm-id]"),
    query(".iA .g6"),
    query(r#".nH[role="main"] .ii"#),
    query(".a3s.aiL"),
    // Direct text containers.
    query(".Subject"),
    query(".ha h2"),
    query(".nH .ii > div"),
];

const GENERIC_SCAN_SELECTOR: &str = "body *";
const QUOTED_SELECTOR: &str = ".gmail_quote";
const COMPOSE_BOX_SELECTOR: &str = r#"[role="textbox"]"#;
const SUBJECT_SELECTOR: &str = ".hP, [data-thread-title]";
const SENDER_SELECTOR: &str = ".gD, .go";

const EN_PLACEHOLDER: &str = "Replying to an email whose content couldn't be automatically detected. \
                              Please create a polite and brief reply.";
const JA_PLACEHOLDER: &str = "日本語のメールに返信しています。内容が自動的に検出できませんでした。\
                              礼儀正しく簡潔な返信を作成してください。";

/// Extracts the body of the email being replied to.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    queries: Vec<ContentQuery>,
    /// Selector for the active compose window; `None` searches the whole page.
    compose_scope: Option<String>,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_QUERIES.to_vec())
    }
}

impl ContentExtractor {
    pub fn new(queries: Vec<ContentQuery>) -> Self {
        Self {
            queries,
            compose_scope: None,
        }
    }

    /// Read the compose box only inside the element matching `selector`.
    ///
    /// With several compose windows open, an unscoped lookup takes the
    /// first textbox in document order, which may belong to another draft.
    pub fn with_compose_scope(mut self, selector: impl Into<String>) -> Self {
        self.compose_scope = Some(selector.into());
        self
    }

    /// Run the cascade. Never fails; `content` is always non-empty.
    pub fn extract<D: Document + ?Sized>(&self, doc: &D) -> ExtractionResult {
        let subject = first_text(doc, SUBJECT_SELECTOR);
        let sender = first_text(doc, SENDER_SELECTOR);
        if let Some(subject) = &subject {
            debug!(subject = subject.as_str(), "Found subject line");
        }

        let found = self
            .longest_selector_match(doc)
            .map(|t| (t, ContentSource::Selector))
            .or_else(|| longest_visible_block(doc).map(|t| (t, ContentSource::GenericScan)))
            .or_else(|| first_text(doc, QUOTED_SELECTOR).map(|t| (t, ContentSource::QuotedBlock)))
            .or_else(|| {
                compose_box_text(doc, self.compose_scope.as_deref())
                    .map(|t| (t, ContentSource::ComposeBox))
            })
            .or_else(|| {
                subject_composite(subject.as_deref(), sender.as_deref())
                    .map(|t| (t, ContentSource::SubjectLine))
            });

        match found {
            Some((content, source)) if content.chars().count() >= MIN_USABLE_CHARS => {
                let language = classify(&content);
                info!(
                    source = ?source,
                    chars = content.chars().count(),
                    language = %language,
                    "Extracted email content"
                );
                ExtractionResult {
                    content,
                    language,
                    source,
                }
            }
            _ => placeholder(doc, subject.as_deref(), sender.as_deref()),
        }
    }

    /// Longest text over every query, not just the first query that matches.
    fn longest_selector_match<D: Document + ?Sized>(&self, doc: &D) -> Option<String> {
        let mut best: Option<(usize, String)> = None;
        for q in &self.queries {
            let matches = doc.query_all(q.selector);
            if matches.is_empty() {
                continue;
            }
            debug!(selector = q.selector, count = matches.len(), "Selector matched");
            for el in matches {
                let len = el.char_len();
                if len > q.min_chars && best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
                    best = Some((len, el.text));
                }
            }
        }
        best.map(|(_, text)| text)
    }
}

/// Convenience wrapper using the default query list.
pub fn extract<D: Document + ?Sized>(doc: &D) -> ExtractionResult {
    ContentExtractor::default().extract(doc)
}

fn first_text<D: Document + ?Sized>(doc: &D, selector: &str) -> Option<String> {
    doc.query_first(selector)
        .map(|el| el.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn longest_visible_block<D: Document + ?Sized>(doc: &D) -> Option<String> {
    let candidates = doc.query_all(GENERIC_SCAN_SELECTOR);
    let best = candidates
        .into_iter()
        .filter(|el| el.visible && el.char_len() >= MIN_GENERIC_CHARS)
        // max_by_key keeps the last maximum; reverse so the first one in document order wins.
        .rev()
        .max_by_key(|el| el.char_len())?;
    debug!(chars = best.char_len(), "Using longest visible text block");
    Some(best.text)
}

fn compose_box_text<D: Document + ?Sized>(doc: &D, scope: Option<&str>) -> Option<String> {
    let selector = match scope {
        Some(scope) => format!("{scope} {COMPOSE_BOX_SELECTOR}"),
        None => COMPOSE_BOX_SELECTOR.to_string(),
    };
    doc.query_first(&selector)
        .filter(|el| el.char_len() > MIN_COMPOSE_CHARS)
        .map(|el| el.text)
}

fn subject_composite(subject: Option<&str>, sender: Option<&str>) -> Option<String> {
    match (subject, sender) {
        (Some(subject), Some(sender)) => Some(format!("Subject: {subject}\nFrom: {sender}")),
        (Some(subject), None) => Some(format!("Subject: {subject}")),
        (None, Some(sender)) => Some(format!("From: {sender}")),
        (None, None) => None,
    }
}

fn placeholder<D: Document + ?Sized>(
    doc: &D,
    subject: Option<&str>,
    sender: Option<&str>,
) -> ExtractionResult {
    warn!("No email content could be extracted, using placeholder");

    let body = doc.body_text();
    let subjects: Vec<String> = doc
        .query_all(SUBJECT_SELECTOR)
        .into_iter()
        .map(|el| el.text)
        .collect();
    let japanese = has_japanese_context(
        std::iter::once(body.as_str())
            .chain(subjects.iter().map(String::as_str))
            .chain(doc.location()),
    );

    let (mut content, subject_label, sender_label) = if japanese {
        (JA_PLACEHOLDER.to_string(), "件名", "送信者")
    } else {
        (EN_PLACEHOLDER.to_string(), "Subject", "Sender")
    };
    if let Some(subject) = subject {
        content.push_str(&format!("\n\n{subject_label}: {subject}"));
    }
    if let Some(sender) = sender {
        content.push_str(&format!("\n{sender_label}: {sender}"));
    }

    let language = if japanese {
        LanguageCode::Ja
    } else {
        classify(&content)
    };
    ExtractionResult {
        content,
        language,
        source: ContentSource::Placeholder,
    }
}
