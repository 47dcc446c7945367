//! Reply pipeline.
//!
//! Extracted content flows through:
//! 1. `ReplyPipeline::draft_reply()`: credential check, then model failover
//! 2. `templates`: deterministic fallback when every endpoint fails
//! 3. `format::format_reply()`: paragraph markup for the compose surface
//!
//! The caller owns writing the reply into the page.

pub mod format;
pub mod processor;
pub mod templates;
pub mod types;

pub use processor::{ComposeSession, InFlightGuard, ReplyPipeline};
pub use types::{
    ContentSource, ExtractionResult, LanguageKind, ReplyRequest, ReplyResult, ToneKind,
};
