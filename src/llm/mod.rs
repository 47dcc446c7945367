//! Reply generation against a generative text provider.
//!
//! - `provider`: the `TextProvider` trait and request shape
//! - `gemini`: reqwest client for the Gemini `generateContent` API
//! - `prompt`: prompt construction and content truncation
//! - `failover`: ordered, one-attempt-per-endpoint model failover

pub mod failover;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use failover::{FailoverGenerator, GeneratedReply};
pub use gemini::GeminiClient;
pub use provider::{GenerateContentRequest, GenerationConfig, TextProvider};

use std::sync::Arc;

use crate::config::{GeneratorConfig, Settings};
use crate::error::ConfigError;

/// Create the default provider from configuration.
pub fn create_provider(config: &GeneratorConfig) -> Result<Arc<dyn TextProvider>, ConfigError> {
    let client = GeminiClient::from_config(config)?;
    tracing::info!(
        base_url = config.base_url.as_str(),
        models = config.models.len(),
        "Using Gemini provider"
    );
    Ok(Arc::new(client))
}

/// Check the configured API key with a minimal request; returns the model's greeting.
pub async fn probe_api_key(settings: &Settings, config: &GeneratorConfig) -> crate::error::Result<String> {
    let api_key = settings.require_api_key()?;
    let client = GeminiClient::from_config(config)?;
    Ok(client.probe(api_key).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_constructs_without_network() {
        let provider = create_provider(&GeneratorConfig::default());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "gemini");
    }

    #[tokio::test]
    async fn probe_without_key_is_a_config_error() {
        let err = probe_api_key(&Settings::default(), &GeneratorConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::MissingRequired { ref key, .. }) if key == "GEMINI_API_KEY"
        ));
    }
}
