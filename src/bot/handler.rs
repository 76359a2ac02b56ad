use std::future::Future;

use anyhow::Result;

use crate::agent::{AgentStep, Assistant};
use crate::llm::provider::LlmProvider;
use crate::lookup::LookupProvider;
use crate::trace::SessionTrace;

pub const START_TEXT: &str = "Hello! I am an AI assistant that can help with basic web searches, rickshaw fare charts and bus service schedule at Bangladesh Agricultural University.";
pub const HELP_TEXT: &str =
    "You can ask me for the weather in any city or to search for information on the web!";
pub const PLACEHOLDER_TEXT: &str = "Processing your message...";
/// Telegram rejects longer message bodies.
pub const MAX_REPLY_CHARS: usize = 4096;

/// Outbound half of a chat platform, as seen by the handler.
pub trait ChatTransport: Send + Sync {
    /// Returns the id of the sent message so it can be edited later.
    fn send_text(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64>> + Send;

    fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Start,
    Help,
    IgnoredCommand,
    Question,
}

pub fn route(text: &str) -> Route {
    let Some(command) = text.trim().strip_prefix('/') else {
        return Route::Question;
    };
    // "/start@SomeBot args" addresses the command to one bot in a group.
    let name = command
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split('@')
        .next()
        .unwrap_or_default();
    match name {
        "start" => Route::Start,
        "help" => Route::Help,
        _ => Route::IgnoredCommand,
    }
}

pub fn truncate_reply(text: String) -> String {
    if text.chars().count() <= MAX_REPLY_CHARS {
        return text;
    }
    text.chars().take(MAX_REPLY_CHARS).collect()
}

pub fn error_reply(detail: &str) -> String {
    format!("Sorry, an error occurred: {detail}")
}

pub struct MessageHandler<P, L> {
    assistant: Assistant<P, L>,
    trace: Option<SessionTrace>,
    echo_steps: bool,
}

impl<P: LlmProvider, L: LookupProvider> MessageHandler<P, L> {
    pub fn new(assistant: Assistant<P, L>, trace: Option<SessionTrace>) -> Self {
        Self {
            assistant,
            trace,
            echo_steps: false,
        }
    }

    /// Prints every agent step to stderr while a message is being answered.
    pub fn with_step_echo(mut self, enabled: bool) -> Self {
        self.echo_steps = enabled;
        self
    }

    /// Full chat contract for one inbound text: static replies for the known
    /// commands, otherwise a placeholder that is always edited into the answer
    /// or an apology.
    pub async fn handle_text<T: ChatTransport>(
        &self,
        transport: &T,
        chat_id: i64,
        text: &str,
    ) -> Result<()> {
        match route(text) {
            Route::Start => {
                transport.send_text(chat_id, START_TEXT).await?;
            }
            Route::Help => {
                transport.send_text(chat_id, HELP_TEXT).await?;
            }
            Route::IgnoredCommand => {}
            Route::Question => {
                let placeholder_id = transport.send_text(chat_id, PLACEHOLDER_TEXT).await?;
                let reply = self.answer(chat_id, text).await;
                transport.edit_text(chat_id, placeholder_id, &reply).await?;
            }
        }
        Ok(())
    }

    /// Same contract without a transport; `None` for ignored commands.
    pub async fn reply_once(&self, chat_id: i64, text: &str) -> Option<String> {
        match route(text) {
            Route::Start => Some(START_TEXT.to_string()),
            Route::Help => Some(HELP_TEXT.to_string()),
            Route::IgnoredCommand => None,
            Route::Question => Some(self.answer(chat_id, text).await),
        }
    }

    pub fn report_error(&self, message: &str) {
        eprintln!("campus-assistant: {message}");
        if let Some(trace) = &self.trace {
            trace.log_chat_error(message);
        }
    }

    async fn answer(&self, chat_id: i64, text: &str) -> String {
        let trace = self.trace.as_ref();
        if let Some(trace) = trace {
            trace.log_chat_in(chat_id, text);
        }

        let echo_steps = self.echo_steps;
        let mut on_step = |step: &AgentStep| {
            if echo_steps {
                eprintln!("agent: {step}");
            }
            if let Some(trace) = trace {
                trace.log_agent_step(step);
            }
        };
        let reply = match self.assistant.answer(text, &mut on_step).await {
            Ok(answer) => truncate_reply(answer.into_reply()),
            Err(err) => {
                if let Some(trace) = trace {
                    trace.log_chat_error(&err.to_string());
                }
                error_reply(&err.to_string())
            }
        };

        if let Some(trace) = trace {
            trace.log_chat_out(chat_id, &reply);
        }
        reply
    }
}
