//! Gemini `generateContent` client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{ConfigError, ProviderError};

use super::provider::{GenerateContentRequest, GenerationConfig, TextProvider};

/// Model used by the API key probe.
pub const PROBE_MODEL: &str = "gemini-2.0-flash";
const PROBE_PROMPT: &str = "Hello, please reply with a short greeting.";

/// Error bodies longer than this are cut in error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// `timeout` bounds each request; expiry is reported as a request failure.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http_client".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Self::new(&config.base_url, config.request_timeout)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Check that `api_key` works by asking for a short greeting.
    pub async fn probe(&self, api_key: &SecretString) -> Result<String, ProviderError> {
        let request = GenerateContentRequest::from_prompt(
            PROBE_PROMPT,
            GenerationConfig {
                temperature: 0.7,
                top_k: None,
                top_p: None,
                max_output_tokens: 20,
            },
        );
        let text = self.generate(PROBE_MODEL, api_key, &request).await?;
        info!(model = PROBE_MODEL, "API key probe succeeded");
        Ok(text)
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        model: &str,
        api_key: &SecretString,
        request: &GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        debug!(model, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| request_failed(model, e))?;

        let status = response.status();
        debug!(model, status = status.as_u16(), "Provider responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model, status = status.as_u16(), "Provider returned an error status");
            return Err(ProviderError::HttpStatus {
                model: model.to_string(),
                status: status.as_u16(),
                body: clip(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let body = response.text().await.map_err(|e| request_failed(model, e))?;
        parse_candidate_text(model, &body)
    }
}

// The URL carries the API key as a query parameter; never let it reach an error message.
fn request_failed(model: &str, err: reqwest::Error) -> ProviderError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.without_url().to_string()
    };
    ProviderError::RequestFailed {
        model: model.to_string(),
        reason,
    }
}

// ── Response shape ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extract `candidates[0].content.parts[0].text` from a success body.
///
/// An `error` payload, undecodable JSON, or a missing/blank text are all errors.
pub fn parse_candidate_text(model: &str, body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse {
            model: model.to_string(),
            reason: format!("undecodable JSON: {e}"),
        })?;

    if let Some(error) = parsed.error {
        return Err(ProviderError::Api {
            model: model.to_string(),
            message: error
                .message
                .unwrap_or_else(|| "provider returned an error".to_string()),
        });
    }

    let candidate_count = parsed.candidates.as_ref().map_or(0, Vec::len);
    debug!(model, candidate_count, "Parsed provider response");

    parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse {
            model: model.to_string(),
            reason: "response has no candidate text".to_string(),
        })
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_candidate_text() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"Dear Ana,"},{"text":"ignored"}]}},
            {"content":{"parts":[{"text":"second"}]}}
        ]}"#;
        assert_eq!(parse_candidate_text("m", body).unwrap(), "Dear Ana,");
    }

    #[test]
    fn error_payload_is_api_error() {
        let body = r#"{"error":{"code":429,"message":"Resource exhausted"}}"#;
        match parse_candidate_text("gemini-pro", body) {
            Err(ProviderError::Api { model, message }) => {
                assert_eq!(model, "gemini-pro");
                assert_eq!(message, "Resource exhausted");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn missing_candidate_shapes_are_invalid() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":null}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#,
            "not json",
        ] {
            assert!(
                matches!(
                    parse_candidate_text("m", body),
                    Err(ProviderError::InvalidResponse { .. })
                ),
                "body: {body}"
            );
        }
    }

    #[test]
    fn endpoint_includes_model_and_method() {
        let client = GeminiClient::new("http://localhost:9999/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("gemini-1.5-pro"),
            "http://localhost:9999/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("短い", 5), "短い");
        assert_eq!(clip("日本語テキスト", 3), "日本語...");
    }
}
