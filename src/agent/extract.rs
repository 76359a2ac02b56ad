use crate::agent::AgentStep;

pub const NO_ANSWER_REPLY: &str = "I processed your request but couldn't generate a response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalAnswer {
    Text(String),
    NoAnswerProduced,
}

impl FinalAnswer {
    /// Text sent back to the user.
    pub fn into_reply(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::NoAnswerProduced => NO_ANSWER_REPLY.to_string(),
        }
    }
}

pub fn extract_final_answer(steps: &[AgentStep]) -> FinalAnswer {
    steps
        .iter()
        .rev()
        .find_map(|step| match step {
            AgentStep::Final { text } => Some(FinalAnswer::Text(text.clone())),
            _ => None,
        })
        .unwrap_or(FinalAnswer::NoAnswerProduced)
}
