//! Error types for the reply assistant.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Generative provider errors.
///
/// Every variant except `Exhausted` and `NoEndpoints` describes a single
/// endpoint attempt; the failover loop records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request to model {model} failed: {reason}")]
    RequestFailed { model: String, reason: String },

    #[error("Model {model} returned HTTP {status}: {body}")]
    HttpStatus {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Model {model} reported an error: {message}")]
    Api { model: String, message: String },

    #[error("Invalid response from model {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("All {attempts} model endpoints failed; last error: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<ProviderError>,
    },

    #[error("No model endpoints configured")]
    NoEndpoints,
}

impl ProviderError {
    /// Model identifier the error came from, if it belongs to a single attempt.
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { model, .. }
            | Self::HttpStatus { model, .. }
            | Self::Api { model, .. }
            | Self::InvalidResponse { model, .. } => Some(model),
            Self::Exhausted { last, .. } => last.model(),
            Self::NoEndpoints => None,
        }
    }
}

/// Errors surfaced to whoever triggered a reply.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error(
        "API key is not configured. Add a valid Gemini API key in the extension settings."
    )]
    MissingCredential,

    #[error("A reply is already being generated for this compose window")]
    Busy,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
