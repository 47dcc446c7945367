//! Email body extraction from an unstable webmail page.
//!
//! The page is reached only through the [`Document`] capability, so the
//! cascade runs the same against a parsed HTML snapshot or a test fixture.

pub mod document;
pub mod extractor;
pub mod html;

pub use document::{Document, ElementView};
pub use extractor::{ContentExtractor, ContentQuery, DEFAULT_CONTENT_QUERIES, extract};
pub use html::HtmlDocument;
