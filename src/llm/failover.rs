//! Sequential failover across model endpoints.
//!
//! Each endpoint gets exactly one attempt, in list order; the first
//! well-formed reply wins. Attempts never overlap: concurrent speculative
//! calls would each be billed against the user's quota.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::error::ProviderError;
use crate::pipeline::types::ReplyRequest;

use super::prompt::build_prompt;
use super::provider::{GenerateContentRequest, GenerationConfig, TextProvider};

/// Text produced by the first endpoint that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
    pub model: String,
    /// Attempts made, including the successful one.
    pub attempts: usize,
}

/// Tries each configured model in order until one returns text.
pub struct FailoverGenerator {
    provider: Arc<dyn TextProvider>,
    config: GeneratorConfig,
}

impl FailoverGenerator {
    pub fn new(provider: Arc<dyn TextProvider>, config: GeneratorConfig) -> Self {
        Self { provider, config }
    }

    /// Generate a reply, or `Exhausted` carrying the last endpoint's error.
    pub async fn generate(
        &self,
        request: &ReplyRequest,
        api_key: &SecretString,
    ) -> Result<GeneratedReply, ProviderError> {
        let prompt = build_prompt(request, self.config.max_prompt_chars);
        let body =
            GenerateContentRequest::from_prompt(prompt, GenerationConfig::from(&self.config));

        info!(
            provider = self.provider.name(),
            endpoints = self.config.models.len(),
            tone = %request.tone,
            language = %request.target_language(),
            content_chars = request.email_content.chars().count(),
            "Requesting reply"
        );

        let mut last_error = None;
        let mut attempts = 0;

        for model in self.config.models.iter() {
            attempts += 1;
            info!(model, attempt = attempts, "Trying model");

            match self.provider.generate(model, api_key, &body).await {
                Ok(text) => {
                    info!(model, chars = text.chars().count(), "Model produced a reply");
                    return Ok(GeneratedReply {
                        text,
                        model: model.to_string(),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(model, error = %e, "Model failed, moving to next endpoint");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(last) => ProviderError::Exhausted {
                attempts,
                last: Box::new(last),
            },
            None => ProviderError::NoEndpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::ModelEndpointList;
    use crate::language::LanguageCode;
    use crate::pipeline::types::{LanguageKind, ToneKind};

    /// Succeeds only for one model; records every call.
    struct ScriptedProvider {
        succeed_on: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(succeed_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                succeed_on,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            model: &str,
            _api_key: &SecretString,
            request: &GenerateContentRequest,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(model.to_string());
            assert!(request.prompt().is_some_and(|p| p.contains("Original email")));
            if self.succeed_on == Some(model) {
                Ok(format!("reply from {model}"))
            } else {
                Err(ProviderError::HttpStatus {
                    model: model.to_string(),
                    status: 503,
                    body: format!("{model} unavailable"),
                })
            }
        }
    }

    fn config(models: &[&str]) -> GeneratorConfig {
        GeneratorConfig {
            models: ModelEndpointList::new(models.iter().copied()).unwrap(),
            ..Default::default()
        }
    }

    fn request() -> ReplyRequest {
        ReplyRequest {
            email_content: "Could you send the slides?".into(),
            tone: ToneKind::Professional,
            language: LanguageKind::Detect,
            original_language: LanguageCode::En,
            unknown_content: false,
        }
    }

    fn key() -> SecretString {
        SecretString::from("test-key")
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let provider = ScriptedProvider::new(Some("m3"));
        let generator = FailoverGenerator::new(provider.clone(), config(&["m1", "m2", "m3", "m4"]));

        let reply = generator.generate(&request(), &key()).await.unwrap();
        assert_eq!(reply.text, "reply from m3");
        assert_eq!(reply.model, "m3");
        assert_eq!(reply.attempts, 3);
        assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn first_endpoint_success_makes_one_call() {
        let provider = ScriptedProvider::new(Some("m1"));
        let generator = FailoverGenerator::new(provider.clone(), config(&["m1", "m2"]));
        let reply = generator.generate(&request(), &key()).await.unwrap();
        assert_eq!(reply.attempts, 1);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn all_failing_reports_last_error_once() {
        let provider = ScriptedProvider::new(None);
        let generator = FailoverGenerator::new(provider.clone(), config(&["m1", "m2", "m3"]));

        let err = generator.generate(&request(), &key()).await.unwrap_err();
        match err {
            ProviderError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    *last,
                    ProviderError::HttpStatus { ref model, .. } if model == "m3"
                ));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
    }
}
