//! Provider abstraction and the `generateContent` request shape.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::ProviderError;

/// `{ contents: [{ parts: [{ text }] }], generationConfig: {..} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Single-turn request carrying one text prompt.
    pub fn from_prompt(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }

    /// The prompt text, for logging and tests.
    pub fn prompt(&self) -> Option<&str> {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// Sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

impl From<&GeneratorConfig> for GenerationConfig {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: Some(config.top_k),
            top_p: Some(config.top_p),
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A text-generation backend addressed by model identifier.
///
/// One call is one attempt: implementations do not retry, and any
/// malformed or unsuccessful payload is an `Err`.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Send `request` to `model` and return the first candidate's text.
    async fn generate(
        &self,
        model: &str,
        api_key: &SecretString,
        request: &GenerateContentRequest,
    ) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_provider_shape() {
        let request = GenerateContentRequest::from_prompt(
            "Write a reply",
            GenerationConfig::from(&GeneratorConfig::default()),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Write a reply");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert!(json["generationConfig"]["topP"].is_f64());
        assert_eq!(request.prompt(), Some("Write a reply"));
    }

    #[test]
    fn optional_sampling_fields_are_omitted() {
        let config = GenerationConfig {
            temperature: 0.7,
            top_k: None,
            top_p: None,
            max_output_tokens: 20,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("topK").is_none());
        assert!(json.get("topP").is_none());
        assert_eq!(json["maxOutputTokens"], 20);
    }
}
