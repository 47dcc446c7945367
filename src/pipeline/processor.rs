//! Reply pipeline: credential check → failover generation → formatting,
//! with the template fallback standing in when every endpoint fails.
//!
//! Generation failure is never shown to the user as an error; only a
//! missing API key is, because no template can fix configuration.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::ReplyError;
use crate::llm::FailoverGenerator;
use crate::pipeline::format::format_reply;
use crate::pipeline::templates::TemplateMatrix;
use crate::pipeline::types::{ExtractionResult, ReplyRequest, ReplyResult};

/// End-to-end reply drafting for one extracted email.
pub struct ReplyPipeline {
    generator: FailoverGenerator,
    templates: &'static TemplateMatrix,
}

impl ReplyPipeline {
    pub fn new(generator: FailoverGenerator) -> Self {
        Self {
            generator,
            templates: TemplateMatrix::builtin(),
        }
    }

    /// Draft a reply. Always returns a usable reply unless the API key is missing.
    pub async fn draft_reply(
        &self,
        settings: &Settings,
        extraction: ExtractionResult,
    ) -> ReplyResult {
        let request_id = Uuid::new_v4();
        let span = info_span!("draft_reply", %request_id);
        async {
            let result = self.run(settings, extraction).await;
            info!(outcome = result.label(), "Reply ready");
            result
        }
        .instrument(span)
        .await
    }

    /// Like [`draft_reply`](Self::draft_reply), but discards the result if
    /// `teardown` resolves first (the reply surface was closed).
    pub async fn draft_reply_until<F>(
        &self,
        settings: &Settings,
        extraction: ExtractionResult,
        teardown: F,
    ) -> Option<ReplyResult>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.draft_reply(settings, extraction) => Some(result),
            () = teardown => {
                info!("Reply surface closed before the reply was ready, discarding");
                None
            }
        }
    }

    async fn run(&self, settings: &Settings, extraction: ExtractionResult) -> ReplyResult {
        let Some(api_key) = settings.usable_api_key() else {
            error!("API key not set");
            return ReplyResult::Failure {
                message: ReplyError::MissingCredential.to_string(),
                details: None,
            };
        };

        let request = ReplyRequest::new(extraction, settings.tone, settings.language);
        info!(
            tone = %request.tone,
            original_language = %request.original_language,
            unknown_content = request.unknown_content,
            "Drafting reply"
        );

        let reply = match self.generator.generate(&request, api_key).await {
            Ok(generated) => {
                info!(
                    model = generated.model.as_str(),
                    attempts = generated.attempts,
                    "Generated reply"
                );
                format_reply(&generated.text)
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, using template fallback");
                let fallback = self.templates.fallback(
                    &request.email_content,
                    request.tone,
                    request.original_language,
                );
                // Templates are already paragraph markup; this is a no-op.
                format_reply(&fallback)
            }
        };

        ReplyResult::Success { reply }
    }
}

// ── Single-flight guard ─────────────────────────────────────────────

/// Per-compose-surface guard against overlapping reply requests.
///
/// Hold the returned guard for the duration of a request; the session
/// frees up when it is dropped.
#[derive(Debug, Default, Clone)]
pub struct ComposeSession {
    in_flight: Arc<AtomicBool>,
}

impl ComposeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, or `Busy` if one is already outstanding.
    pub fn begin(&self) -> Result<InFlightGuard, ReplyError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReplyError::Busy)?;
        Ok(InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Marks a request as outstanding until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::config::{GeneratorConfig, ModelEndpointList};
    use crate::error::ProviderError;
    use crate::language::LanguageCode;
    use crate::llm::{GenerateContentRequest, TextProvider};
    use crate::pipeline::format::paragraph;
    use crate::pipeline::types::{ContentSource, LanguageKind, ToneKind};

    enum Script {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct StubProvider {
        script: Script,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TextProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(
            &self,
            model: &str,
            _api_key: &SecretString,
            _request: &GenerateContentRequest,
        ) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            match self.script {
                Script::Reply(text) => Ok(text.to_string()),
                Script::Fail => Err(ProviderError::RequestFailed {
                    model: model.to_string(),
                    reason: "connection refused".into(),
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    fn pipeline(script: Script) -> (ReplyPipeline, Arc<StubProvider>) {
        let provider = Arc::new(StubProvider {
            script,
            calls: Mutex::new(0),
        });
        let config = GeneratorConfig {
            models: ModelEndpointList::new(["a", "b"]).unwrap(),
            ..Default::default()
        };
        let generator = FailoverGenerator::new(provider.clone(), config);
        (ReplyPipeline::new(generator), provider)
    }

    fn settings(key: Option<&str>) -> Settings {
        Settings {
            api_key: key.map(SecretString::from),
            tone: ToneKind::Friendly,
            language: LanguageKind::Detect,
        }
    }

    fn extraction(content: &str, language: LanguageCode) -> ExtractionResult {
        ExtractionResult {
            content: content.into(),
            language,
            source: ContentSource::Selector,
        }
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling_provider() {
        let (pipeline, provider) = pipeline(Script::Reply("unused"));
        let result = pipeline
            .draft_reply(&settings(None), extraction("Hi there friend", LanguageCode::En))
            .await;
        match result {
            ReplyResult::Failure { message, details } => {
                assert!(message.contains("API key is not configured"));
                assert!(details.is_none());
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn generated_text_is_formatted() {
        let (pipeline, _) = pipeline(Script::Reply("Hi Ana,\n\nSounds good.\n\nBest,"));
        let result = pipeline
            .draft_reply(&settings(Some("k")), extraction("Ana Silva wrote", LanguageCode::En))
            .await;
        assert_eq!(
            result,
            ReplyResult::Success {
                reply: format!(
                    "{}{}{}",
                    paragraph("Hi Ana,"),
                    paragraph("Sounds good."),
                    paragraph("Best,")
                )
            }
        );
    }

    #[tokio::test]
    async fn markup_from_provider_passes_through() {
        let markup = "<div style=\"margin-bottom: 12px;\">Hello</div>";
        let (pipeline, _) = pipeline(Script::Reply(markup));
        let result = pipeline
            .draft_reply(&settings(Some("k")), extraction("x y", LanguageCode::En))
            .await;
        assert_eq!(
            result,
            ReplyResult::Success {
                reply: markup.to_string()
            }
        );
    }

    #[tokio::test]
    async fn exhausted_endpoints_fall_back_to_template_in_detected_language() {
        let (pipeline, provider) = pipeline(Script::Fail);
        let content = "田中 太郎です。来週の打ち合わせについて。";
        let result = pipeline
            .draft_reply(&settings(Some("k")), extraction(content, LanguageCode::Ja))
            .await;

        let expected = TemplateMatrix::builtin().fallback(content, ToneKind::Friendly, LanguageCode::Ja);
        assert_eq!(result, ReplyResult::Success { reply: expected });
        assert_eq!(*provider.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn teardown_discards_pending_result() {
        let (pipeline, _) = pipeline(Script::Hang);
        let result = pipeline
            .draft_reply_until(
                &settings(Some("k")),
                extraction("Long running request", LanguageCode::En),
                tokio::time::sleep(Duration::from_millis(10)),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn teardown_after_completion_keeps_result() {
        let (pipeline, _) = pipeline(Script::Reply("Done"));
        let result = pipeline
            .draft_reply_until(
                &settings(Some("k")),
                extraction("Quick request", LanguageCode::En),
                std::future::pending(),
            )
            .await;
        assert!(matches!(result, Some(ReplyResult::Success { .. })));
    }

    #[test]
    fn compose_session_rejects_overlapping_requests() {
        let session = ComposeSession::new();
        let guard = session.begin().unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.clone().begin(), Err(ReplyError::Busy)));
        drop(guard);
        assert!(!session.is_busy());
        assert!(session.begin().is_ok());
    }
}
