//! The narrow document capability the extractor reads from.

/// Snapshot of one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementView {
    /// Rendered text, roughly what a browser reports as `innerText`.
    pub text: String,
    /// False when the element or an ancestor is hidden, undisplayed or fully transparent.
    pub visible: bool,
}

impl ElementView {
    pub fn new(text: impl Into<String>, visible: bool) -> Self {
        Self {
            text: text.into(),
            visible,
        }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Read-only view of a webmail page.
///
/// Implementations must never fail: an unknown or malformed selector
/// simply matches nothing. Queries always run against the whole page; to
/// confine a lookup to one compose window, prefix the selector with that
/// window's selector (see `ContentExtractor::with_compose_scope`).
pub trait Document {
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementView>;

    /// First element matching `selector`.
    fn query_first(&self, selector: &str) -> Option<ElementView> {
        self.query_all(selector).into_iter().next()
    }

    /// Visible text of the whole page body.
    fn body_text(&self) -> String;

    /// Page URL, when known.
    fn location(&self) -> Option<&str> {
        None
    }
}
