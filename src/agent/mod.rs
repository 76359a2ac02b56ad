//! Tool-routing loop: one user message in, an ordered list of steps out.

mod dispatch;
mod extract;
mod loop_impl;
mod prompt;

pub use dispatch::{Capability, CapabilityParseError, tool_declarations};
pub use extract::{FinalAnswer, NO_ANSWER_REPLY, extract_final_answer};
pub use loop_impl::{
    AgentConfig, AgentError, AgentStep, DEFAULT_CAMPUS_WEATHER_CITY, run_message,
    run_message_with_events,
};

use crate::knowledge::KnowledgeContext;
use crate::llm::provider::LlmProvider;
use crate::lookup::LookupProvider;

/// Everything one message invocation needs, built once and shared read-only
/// across concurrent chat tasks.
#[derive(Debug)]
pub struct Assistant<P, L> {
    provider: P,
    lookups: L,
    knowledge: KnowledgeContext,
    config: AgentConfig,
}

impl<P: LlmProvider, L: LookupProvider> Assistant<P, L> {
    pub fn new(provider: P, lookups: L, knowledge: KnowledgeContext, config: AgentConfig) -> Self {
        Self {
            provider,
            lookups,
            knowledge,
            config,
        }
    }

    pub async fn answer<F: FnMut(&AgentStep) + Send>(
        &self,
        message: &str,
        on_step: &mut F,
    ) -> Result<FinalAnswer, AgentError> {
        let steps = run_message_with_events(
            &self.provider,
            &self.lookups,
            &self.knowledge,
            message,
            &self.config,
            on_step,
        )
        .await?;
        Ok(extract_final_answer(&steps))
    }
}
