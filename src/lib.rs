pub mod agent;
pub mod bot;
pub mod cli;
pub mod config;
pub mod http;
pub mod knowledge;
pub mod llm;
pub mod lookup;
pub mod trace;

use agent::Assistant;
use anyhow::{Result, anyhow};
use bot::{MessageHandler, TelegramClient, run_polling};
use cli::CliArgs;
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use knowledge::KnowledgeContext;
use llm::openai::OpenAiProvider;
use lookup::Lookups;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub type CampusHandler = MessageHandler<Option<OpenAiProvider>, Lookups>;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let trace = if config.session_trace {
        Some(SessionTrace::create(&generate_session_id())?)
    } else {
        None
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|err| anyhow!("Failed to build HTTP client: {err}"))?;
    let mut http = HttpClient::new(client, HttpDebugConfig::from_verbose(args.verbose));
    if let Some(trace) = &trace {
        http = http.with_trace(trace.clone());
    }
    let handler = build_handler(&config, http.clone(), trace).with_step_echo(args.verbose);

    if let Some(message) = args.ask {
        if let Some(reply) = handler.reply_once(0, &message).await {
            println!("{reply}");
        }
        return Ok(());
    }

    let telegram = TelegramClient::new(
        http,
        config.telegram_base_url.clone(),
        config.telegram_bot_token.clone(),
    )?;
    run_polling(telegram, Arc::new(handler)).await
}

/// A missing OpenAI key is not fatal here: the literal override and the
/// static commands still work, and reasoning turns report it per message.
pub fn build_handler(
    config: &AppConfig,
    http: HttpClient,
    trace: Option<SessionTrace>,
) -> CampusHandler {
    let provider = OpenAiProvider::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )
    .ok();
    let lookups = Lookups::new(http, config.lookup_config());
    let assistant = Assistant::new(
        provider,
        lookups,
        KnowledgeContext::bau(),
        config.agent.clone(),
    );
    MessageHandler::new(assistant, trace)
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
