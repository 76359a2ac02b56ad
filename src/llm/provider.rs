use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters_json_schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Parsed arguments; a raw string when the model sent invalid JSON.
    pub args_json: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    User {
        text: String,
    },
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantInput {
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantOutput {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    MissingApiKey,
    HttpStatus { status: u16, body: String },
    Transport(String),
    Parse(String),
    EmptyResponse,
}

impl Display for LlmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "missing OPENAI_API_KEY"),
            Self::HttpStatus { status, body } => {
                write!(f, "provider request failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "provider transport error: {msg}"),
            Self::Parse(msg) => write!(f, "provider parse error: {msg}"),
            Self::EmptyResponse => write!(f, "provider returned no choices"),
        }
    }
}

impl Error for LlmError {}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

pub trait LlmProvider: Send + Sync {
    fn generate(
        &self,
        input: AssistantInput,
    ) -> impl Future<Output = LlmResult<AssistantOutput>> + Send;
}

/// An unconfigured provider fails every turn instead of failing startup, so
/// messages that never reach the reasoning step still work.
impl<P: LlmProvider> LlmProvider for Option<P> {
    async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
        match self {
            Some(provider) => provider.generate(input).await,
            None => Err(LlmError::MissingApiKey),
        }
    }
}
