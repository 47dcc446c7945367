use std::process::ExitCode;

use anyhow::Context;

use mail_reply_assist::config::{GeneratorConfig, Settings};
use mail_reply_assist::extract::{ContentExtractor, HtmlDocument};
use mail_reply_assist::llm::{FailoverGenerator, create_provider, probe_api_key};
use mail_reply_assist::pipeline::{ReplyPipeline, ReplyResult};

const USAGE: &str = "Usage:\n  \
    mail-reply-assist <page.html> [--url <page-url>] [--compose <selector>]\n  \
    mail-reply-assist --probe\n\n\
    Environment:\n  \
    GEMINI_API_KEY              API key (required)\n  \
    REPLY_TONE                  professional | friendly | concise | detailed\n  \
    REPLY_LANGUAGE              detect | en | zh | ja | es | fr | de\n  \
    REPLY_MODELS                comma-separated model list, tried in order\n  \
    REPLY_BASE_URL              provider base URL\n  \
    REPLY_REQUEST_TIMEOUT_SECS  per-model timeout";

enum Command {
    Draft {
        page: String,
        url: Option<String>,
        compose: Option<String>,
    },
    Probe,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Command> {
    let mut page = None;
    let mut url = None;
    let mut compose = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--probe" => return Some(Command::Probe),
            "--url" => url = Some(args.next()?),
            "--compose" => compose = Some(args.next()?),
            "-h" | "--help" => return None,
            _ if page.is_none() => page = Some(arg),
            _ => return None,
        }
    }
    page.map(|page| Command::Draft { page, url, compose })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    };

    let settings = Settings::from_env();
    let config = GeneratorConfig::from_env()?;

    match command {
        Command::Probe => match probe_api_key(&settings, &config).await {
            Ok(greeting) => {
                eprintln!("API key works. Model said: {}", greeting.trim());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("API key test failed: {e}");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Draft { page, url, compose } => {
            let source = tokio::fs::read_to_string(&page)
                .await
                .with_context(|| format!("failed to read {page}"))?;

            let extraction = {
                let mut doc = HtmlDocument::parse(&source);
                if let Some(url) = url {
                    doc = doc.with_url(url);
                }
                let mut extractor = ContentExtractor::default();
                if let Some(scope) = compose {
                    extractor = extractor.with_compose_scope(scope);
                }
                extractor.extract(&doc)
            };
            eprintln!(
                "Extracted {} chars ({:?}, language {})",
                extraction.content.chars().count(),
                extraction.source,
                extraction.language
            );

            let provider = create_provider(&config)?;
            let pipeline = ReplyPipeline::new(FailoverGenerator::new(provider, config));

            match pipeline.draft_reply(&settings, extraction).await {
                ReplyResult::Success { reply } => {
                    println!("{reply}");
                    Ok(ExitCode::SUCCESS)
                }
                ReplyResult::Failure { message, details } => {
                    eprintln!("Error: {message}");
                    if let Some(details) = details {
                        eprintln!("  {details}");
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
