//! Telegram Bot API over long polling, driven through the shared `HttpClient`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use super::handler::{ChatTransport, MessageHandler};
use crate::http::client::HttpClient;
use crate::llm::provider::LlmProvider;
use crate::lookup::LookupProvider;

pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

const POLL_TIMEOUT_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TelegramClient {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat id and text of a plain text message; other update kinds yield `None`.
    pub fn into_text(self) -> Option<(i64, String)> {
        let message = self.message?;
        let text = message.text?;
        Some((message.chat.id, text))
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramClient {
    pub fn new(http: HttpClient, base_url: String, token: Option<String>) -> Result<Self> {
        let token = token
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("missing TELEGRAM_BOT_TOKEN; set it to run the bot"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let sent: SentMessage = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(sent.message_id)
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<()> {
        // The result is the edited message or `true`; neither is needed.
        let _: Value = self
            .call(
                "editMessageText",
                &json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let response = self
            .http
            .post_json(&url, None, payload)
            .await
            .map_err(|err| anyhow!("Telegram {method} request failed: {}", err.without_url()))?;

        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&response.body).map_err(|err| {
            anyhow!(
                "Telegram {method} returned an unreadable body (HTTP {}): {err}",
                response.status
            )
        })?;
        if !envelope.ok {
            bail!(
                "Telegram {method} failed (HTTP {}): {}",
                response.status,
                envelope
                    .description
                    .as_deref()
                    .unwrap_or("no description")
            );
        }
        envelope
            .result
            .ok_or_else(|| anyhow!("Telegram {method} returned no result"))
    }
}

impl ChatTransport for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text).await
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.edit_message_text(chat_id, message_id, text).await
    }
}

/// Fetches one batch of updates and spawns a task per text message. Returns
/// the next offset together with the spawned tasks.
pub async fn poll_once<P, L>(
    client: &TelegramClient,
    handler: &Arc<MessageHandler<P, L>>,
    offset: i64,
) -> Result<(i64, Vec<JoinHandle<()>>)>
where
    P: LlmProvider + 'static,
    L: LookupProvider + 'static,
{
    let updates = client.get_updates(offset).await?;
    let mut next_offset = offset;
    let mut tasks = Vec::new();

    for update in updates {
        next_offset = next_offset.max(update.update_id + 1);
        let Some((chat_id, text)) = update.into_text() else {
            continue;
        };

        let client = client.clone();
        let handler = Arc::clone(handler);
        tasks.push(tokio::spawn(async move {
            if let Err(err) = handler.handle_text(&client, chat_id, &text).await {
                handler.report_error(&format!("chat {chat_id}: {err:#}"));
            }
        }));
    }

    Ok((next_offset, tasks))
}

/// Long-polls forever. Polling errors are reported and retried after a pause.
pub async fn run_polling<P, L>(
    client: TelegramClient,
    handler: Arc<MessageHandler<P, L>>,
) -> Result<()>
where
    P: LlmProvider + 'static,
    L: LookupProvider + 'static,
{
    let mut offset = 0;
    loop {
        match poll_once(&client, &handler, offset).await {
            Ok((next_offset, _tasks)) => offset = next_offset,
            Err(err) => {
                handler.report_error(&format!("polling failed: {err:#}"));
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
}
