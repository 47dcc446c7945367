//! Configuration types.
//!
//! Everything here is built once at startup and only read afterwards.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::ConfigError;
use crate::pipeline::types::{LanguageKind, ToneKind};

/// Default generative provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model order, tried strictly front to back.
pub const DEFAULT_MODELS: [&str; 5] = [
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-pro",
    "gemini-2.0-pro",
    "gemini-2.0-flash",
];

/// Ordered model identifiers. No mutation API after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpointList {
    models: Vec<String>,
}

impl ModelEndpointList {
    /// Build from an explicit list. Blank entries are dropped.
    pub fn new<I, S>(models: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(Into::into)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "REPLY_MODELS".into(),
                message: "at least one model identifier is required".into(),
            });
        }
        Ok(Self { models })
    }

    /// Parse a comma-separated list (`REPLY_MODELS` format).
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelEndpointList {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Request shaping and endpoint selection for reply generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Provider base URL (no trailing slash).
    pub base_url: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Email content longer than this (in characters) is truncated.
    pub max_prompt_chars: usize,
    /// Per-endpoint timeout; expiry counts as that endpoint failing.
    pub request_timeout: Duration,
    pub models: ModelEndpointList,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.8,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
            max_prompt_chars: 4000,
            request_timeout: Duration::from_secs(30),
            models: ModelEndpointList::default(),
        }
    }
}

impl GeneratorConfig {
    /// Build config from environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key/value source; `lookup` returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("REPLY_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(models) = lookup("REPLY_MODELS") {
            config.models = ModelEndpointList::parse(&models)?;
        }

        if let Some(secs) = lookup("REPLY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_timeout(&secs)?;
        }

        Ok(config)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "REPLY_REQUEST_TIMEOUT_SECS".into(),
        message,
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be at least 1 second".into())),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(invalid(format!("expected whole seconds, got {raw:?}"))),
    }
}

/// User settings as read from the persisted-settings store. Read-only here.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api_key: Option<SecretString>,
    pub tone: ToneKind,
    pub language: LanguageKind,
}

impl Settings {
    /// Build settings from `GEMINI_API_KEY`, `REPLY_TONE` and `REPLY_LANGUAGE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unknown tone or language values fall back to the defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let tone = lookup("REPLY_TONE")
            .map(|t| {
                t.parse().unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring REPLY_TONE");
                    ToneKind::default()
                })
            })
            .unwrap_or_default();

        let language = lookup("REPLY_LANGUAGE")
            .map(|l| {
                l.parse().unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring REPLY_LANGUAGE");
                    LanguageKind::default()
                })
            })
            .unwrap_or_default();

        Self {
            api_key,
            tone,
            language,
        }
    }

    /// The configured key, if present and non-blank.
    pub fn usable_api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    /// Like [`usable_api_key`](Self::usable_api_key), but missing is an error.
    pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.usable_api_key()
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "GEMINI_API_KEY".into(),
                hint: "Set it to a Gemini API key from Google AI Studio.".into(),
            })
    }
}
