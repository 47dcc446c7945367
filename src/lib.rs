//! Mail Reply Assist: draft email replies from a webmail page.
//!
//! Extraction → language detection → model failover → template fallback → formatting.

pub mod config;
pub mod error;
pub mod extract;
pub mod language;
pub mod llm;
pub mod pipeline;
