//! Shared types for the reply pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::language::LanguageCode;

// ── Tone ────────────────────────────────────────────────────────────

/// Requested tone of the reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneKind {
    #[default]
    Professional,
    Friendly,
    Concise,
    Detailed,
}

impl ToneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Concise => "concise",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ToneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Self::Professional),
            "friendly" => Ok(Self::Friendly),
            "concise" => Ok(Self::Concise),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown tone: {other}")),
        }
    }
}

// ── Target language ─────────────────────────────────────────────────

/// Target language setting: follow the detected language, or force one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LanguageKind {
    #[default]
    Detect,
    Fixed(LanguageCode),
}

impl LanguageKind {
    /// Language the reply should be written in.
    pub fn resolve(&self, original: LanguageCode) -> LanguageCode {
        match self {
            Self::Detect => original,
            Self::Fixed(code) => *code,
        }
    }
}

impl FromStr for LanguageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("detect") {
            return Ok(Self::Detect);
        }
        s.parse::<LanguageCode>().map(Self::Fixed)
    }
}

impl TryFrom<String> for LanguageKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageKind> for String {
    fn from(value: LanguageKind) -> Self {
        match value {
            LanguageKind::Detect => "detect".to_string(),
            LanguageKind::Fixed(code) => code.as_str().to_string(),
        }
    }
}

// ── Extraction ──────────────────────────────────────────────────────

/// Which step of the extraction cascade produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Selector,
    GenericScan,
    QuotedBlock,
    ComposeBox,
    SubjectLine,
    /// Nothing was found; content is a synthetic "could not extract" note.
    Placeholder,
}

/// Best-effort body of the email being replied to.
///
/// `content` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: String,
    pub language: LanguageCode,
    pub source: ContentSource,
}

impl ExtractionResult {
    pub fn is_placeholder(&self) -> bool {
        self.source == ContentSource::Placeholder
    }
}

// ── Request / result ────────────────────────────────────────────────

/// Everything the generator needs for one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub email_content: String,
    pub tone: ToneKind,
    pub language: LanguageKind,
    pub original_language: LanguageCode,
    /// Content is a placeholder; the prompt asks for a reply to unknown content.
    pub unknown_content: bool,
}

impl ReplyRequest {
    pub fn new(extraction: ExtractionResult, tone: ToneKind, language: LanguageKind) -> Self {
        let unknown_content = extraction.is_placeholder();
        Self {
            email_content: extraction.content,
            tone,
            language,
            original_language: extraction.language,
            unknown_content,
        }
    }

    /// Language the reply should be written in.
    pub fn target_language(&self) -> LanguageCode {
        self.language.resolve(self.original_language)
    }
}

/// Outcome handed back to the UI-injection collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyResult {
    /// Markup-formatted reply ready for the compose surface.
    Success { reply: String },
    Failure {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl ReplyResult {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}
