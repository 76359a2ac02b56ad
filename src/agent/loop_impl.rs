use std::error::Error;
use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::agent::dispatch::{
    Capability, CapabilityParseError, WEATHER_TOOL, dispatch, invalid_args_result,
    tool_declarations,
};
use crate::agent::prompt::{precaution_nudge, repair_prompt, system_instruction};
use crate::knowledge::KnowledgeContext;
use crate::llm::provider::{
    AssistantInput, AssistantOutput, ChatMessage, LlmError, LlmProvider, ToolCall,
};
use crate::lookup::LookupProvider;

pub const DEFAULT_CAMPUS_WEATHER_CITY: &str = "Mymensingh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Reasoning turns allowed per message, forced weather lookups included.
    pub max_steps: usize,
    pub invalid_response_retries: usize,
    pub enforce_weather_precaution: bool,
    pub campus_weather_city: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            invalid_response_retries: 1,
            enforce_weather_precaution: true,
            campus_weather_city: DEFAULT_CAMPUS_WEATHER_CITY.to_string(),
        }
    }
}

/// One entry of the ordered record a single message invocation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Reasoning {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        args_json: Value,
    },
    ToolResult {
        id: String,
        name: String,
        content: String,
    },
    Final {
        text: String,
    },
}

impl Display for AgentStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reasoning { text } => write!(f, "reasoning: {text}"),
            Self::ToolCall {
                id,
                name,
                args_json,
            } => write!(f, "tool call [{id}] {name} {args_json}"),
            Self::ToolResult { id, name, content } => {
                write!(f, "tool result [{id}] {name}:\n{content}")
            }
            Self::Final { text } => write!(f, "final: {text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    ReasoningUnavailable(LlmError),
    UnknownCapability(String),
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReasoningUnavailable(err) => write!(f, "reasoning unavailable: {err}"),
            Self::UnknownCapability(name) => write!(f, "unknown capability requested: {name}"),
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReasoningUnavailable(err) => Some(err),
            Self::UnknownCapability(_) => None,
        }
    }
}

struct StepLog<'a, F> {
    steps: Vec<AgentStep>,
    on_step: &'a mut F,
}

impl<F: FnMut(&AgentStep)> StepLog<'_, F> {
    fn push(&mut self, step: AgentStep) {
        (self.on_step)(&step);
        self.steps.push(step);
    }
}

pub async fn run_message<P: LlmProvider, L: LookupProvider>(
    provider: &P,
    lookups: &L,
    knowledge: &KnowledgeContext,
    message: &str,
    config: &AgentConfig,
) -> Result<Vec<AgentStep>, AgentError> {
    let mut ignore = |_: &AgentStep| {};
    run_message_with_events(provider, lookups, knowledge, message, config, &mut ignore).await
}

pub async fn run_message_with_events<P, L, F>(
    provider: &P,
    lookups: &L,
    knowledge: &KnowledgeContext,
    message: &str,
    config: &AgentConfig,
    on_step: &mut F,
) -> Result<Vec<AgentStep>, AgentError>
where
    P: LlmProvider,
    L: LookupProvider,
    F: FnMut(&AgentStep) + Send,
{
    let mut log = StepLog {
        steps: Vec::new(),
        on_step,
    };

    if let Some(reply) = knowledge.literal_override(message) {
        log.push(AgentStep::Final {
            text: reply.to_string(),
        });
        return Ok(log.steps);
    }

    let system = system_instruction(knowledge);
    let tools = tool_declarations();
    let needs_precaution =
        config.enforce_weather_precaution && knowledge.is_campus_related(message);
    let mut messages = vec![ChatMessage::User {
        text: message.to_string(),
    }];
    let mut weather_seen = false;
    let mut invalid_response_attempts = 0usize;

    for turn in 1..=config.max_steps {
        let AssistantOutput { text, tool_calls } = provider
            .generate(AssistantInput {
                system_instruction: Some(system.clone()),
                messages: messages.clone(),
                tools: tools.clone(),
            })
            .await
            .map_err(AgentError::ReasoningUnavailable)?;

        // Only the first call of a turn is honoured; the rest never enter history.
        let Some(call) = tool_calls.into_iter().next() else {
            let Some(text) = text else {
                if invalid_response_attempts >= config.invalid_response_retries {
                    break;
                }
                invalid_response_attempts += 1;
                messages.push(ChatMessage::User {
                    text: repair_prompt().to_string(),
                });
                continue;
            };

            // The forced lookup needs a follow-up turn; on the last turn the draft stands.
            if needs_precaution && !weather_seen && turn < config.max_steps {
                log.push(AgentStep::Reasoning { text: text.clone() });
                let capability = Capability::Weather {
                    city: config.campus_weather_city.clone(),
                };
                let call = ToolCall {
                    id: format!("precaution-{turn}"),
                    name: WEATHER_TOOL.to_string(),
                    args_json: capability.args_json(),
                };
                messages.push(ChatMessage::Assistant {
                    text: Some(text),
                    tool_calls: vec![call.clone()],
                });
                exchange(lookups, &mut log, &mut messages, call, Ok(capability)).await;
                messages.push(ChatMessage::User {
                    text: precaution_nudge().to_string(),
                });
                weather_seen = true;
                continue;
            }

            log.push(AgentStep::Final { text });
            return Ok(log.steps);
        };

        messages.push(ChatMessage::Assistant {
            text: text.clone(),
            tool_calls: vec![call.clone()],
        });
        if let Some(text) = text {
            log.push(AgentStep::Reasoning { text });
        }

        let outcome = match Capability::from_call(&call.name, &call.args_json) {
            Ok(capability) => Ok(capability),
            Err(CapabilityParseError::InvalidArgs { detail, .. }) => Err(detail),
            Err(CapabilityParseError::Unknown(name)) => {
                log.push(AgentStep::ToolCall {
                    id: call.id,
                    name: call.name,
                    args_json: call.args_json,
                });
                return Err(AgentError::UnknownCapability(name));
            }
        };
        if outcome.as_ref().is_ok_and(Capability::is_weather) {
            weather_seen = true;
        }
        exchange(lookups, &mut log, &mut messages, call, outcome).await;
    }

    Ok(log.steps)
}

/// Records one call/result pair and feeds the result back to the model.
async fn exchange<L: LookupProvider, F: FnMut(&AgentStep)>(
    lookups: &L,
    log: &mut StepLog<'_, F>,
    messages: &mut Vec<ChatMessage>,
    call: ToolCall,
    outcome: Result<Capability, String>,
) {
    log.push(AgentStep::ToolCall {
        id: call.id.clone(),
        name: call.name.clone(),
        args_json: call.args_json,
    });

    let content = match &outcome {
        Ok(capability) => dispatch(lookups, capability).await,
        Err(detail) => invalid_args_result(detail),
    };

    log.push(AgentStep::ToolResult {
        id: call.id.clone(),
        name: call.name.clone(),
        content: content.clone(),
    });
    messages.push(ChatMessage::Tool {
        call_id: call.id,
        name: call.name,
        content,
    });
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use crate::agent::{
        AgentConfig, AgentError, AgentStep, FinalAnswer, extract_final_answer, run_message,
        run_message_with_events,
    };
    use crate::knowledge::{KnowledgeContext, OVERRIDE_REPLY, OVERRIDE_TRIGGER};
    use crate::llm::provider::{
        AssistantInput, AssistantOutput, ChatMessage, LlmError, LlmProvider, ToolCall,
    };
    use crate::lookup::LookupProvider;

    struct FakeProvider {
        responses: Arc<Mutex<VecDeque<Result<AssistantOutput, LlmError>>>>,
        seen_inputs: Arc<Mutex<Vec<AssistantInput>>>,
    }

    impl FakeProvider {
        fn new(responses: Vec<Result<AssistantOutput, LlmError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::from(responses))),
                seen_inputs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn inputs(&self) -> Vec<AssistantInput> {
            self.seen_inputs.lock().expect("lock").clone()
        }
    }

    impl LlmProvider for FakeProvider {
        async fn generate(&self, input: AssistantInput) -> Result<AssistantOutput, LlmError> {
            self.seen_inputs.lock().expect("lock").push(input);
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .expect("queued response")
        }
    }

    #[derive(Default)]
    struct FakeLookups {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeLookups {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl LookupProvider for FakeLookups {
        async fn weather(&self, city: &str) -> String {
            self.calls.lock().expect("lock").push(format!("weather:{city}"));
            format!("Weather in {city}, BD:\n• Condition: Light rain")
        }

        async fn search(&self, query: &str) -> String {
            self.calls.lock().expect("lock").push(format!("search:{query}"));
            format!("Search query: {query}\n\nSearch results:\n\nNo search results found.")
        }
    }

    fn text(text: &str) -> Result<AssistantOutput, LlmError> {
        Ok(AssistantOutput {
            text: Some(text.to_string()),
            tool_calls: vec![],
        })
    }

    fn empty() -> Result<AssistantOutput, LlmError> {
        Ok(AssistantOutput {
            text: None,
            tool_calls: vec![],
        })
    }

    fn call(id: &str, name: &str, args_json: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            args_json,
        }
    }

    fn calls(text: Option<&str>, tool_calls: Vec<ToolCall>) -> Result<AssistantOutput, LlmError> {
        Ok(AssistantOutput {
            text: text.map(str::to_string),
            tool_calls,
        })
    }

    async fn run(
        provider: &FakeProvider,
        lookups: &FakeLookups,
        message: &str,
    ) -> Result<Vec<AgentStep>, AgentError> {
        run_message(
            provider,
            lookups,
            &KnowledgeContext::bau(),
            message,
            &AgentConfig::default(),
        )
        .await
    }

    #[tokio::test]
    async fn literal_override_skips_reasoning_and_lookups() {
        let provider = FakeProvider::new(vec![]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, OVERRIDE_TRIGGER)
            .await
            .expect("override");

        assert_eq!(
            steps,
            vec![AgentStep::Final {
                text: OVERRIDE_REPLY.to_string()
            }]
        );
        assert!(provider.inputs().is_empty());
        assert!(lookups.calls().is_empty());
    }

    #[tokio::test]
    async fn weather_call_yields_one_call_result_pair_with_exact_content() {
        let provider = FakeProvider::new(vec![
            calls(None, vec![call("c1", "weather", json!({"city": "Dhaka"}))]),
            text("It is raining in Dhaka, take an umbrella."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, "Is it raining in Dhaka?")
            .await
            .expect("answer");

        let expected_content = "Weather in Dhaka, BD:\n• Condition: Light rain".to_string();
        assert_eq!(
            steps,
            vec![
                AgentStep::ToolCall {
                    id: "c1".to_string(),
                    name: "weather".to_string(),
                    args_json: json!({"city": "Dhaka"}),
                },
                AgentStep::ToolResult {
                    id: "c1".to_string(),
                    name: "weather".to_string(),
                    content: expected_content.clone(),
                },
                AgentStep::Final {
                    text: "It is raining in Dhaka, take an umbrella.".to_string()
                },
            ]
        );
        assert_eq!(lookups.calls(), vec!["weather:Dhaka"]);

        let inputs = provider.inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(
            inputs[1].messages.last(),
            Some(&ChatMessage::Tool {
                call_id: "c1".to_string(),
                name: "weather".to_string(),
                content: expected_content,
            })
        );
        let system = inputs[0].system_instruction.as_deref().expect("system");
        assert!(system.contains("Jabbar er Mor"));
        assert_eq!(inputs[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn identical_inputs_produce_identical_steps() {
        let script = || {
            vec![
                calls(None, vec![call("c1", "search", json!({"query": "BAU library hours"}))]),
                text("The library opens at 9 am."),
            ]
        };

        let first = run(
            &FakeProvider::new(script()),
            &FakeLookups::default(),
            "When does the library open?",
        )
        .await
        .expect("first");
        let second = run(
            &FakeProvider::new(script()),
            &FakeLookups::default(),
            "When does the library open?",
        )
        .await
        .expect("second");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_capability_is_an_error() {
        let provider = FakeProvider::new(vec![calls(
            None,
            vec![call("c1", "calculator", json!({"expr": "1+1"}))],
        )]);
        let lookups = FakeLookups::default();

        let err = run(&provider, &lookups, "what is 1+1?")
            .await
            .expect_err("unknown tool");

        assert_eq!(err, AgentError::UnknownCapability("calculator".to_string()));
        assert!(lookups.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_reasoning_unavailable() {
        let provider = FakeProvider::new(vec![Err(LlmError::Transport("timeout".to_string()))]);

        let err = run(&provider, &FakeLookups::default(), "hello")
            .await
            .expect_err("provider down");

        assert_eq!(
            err,
            AgentError::ReasoningUnavailable(LlmError::Transport("timeout".to_string()))
        );
        assert_eq!(
            err.to_string(),
            "reasoning unavailable: provider transport error: timeout"
        );
    }

    #[tokio::test]
    async fn step_limit_ends_without_final_answer() {
        let looping = || calls(None, vec![call("c", "search", json!({"query": "again"}))]);
        let provider = FakeProvider::new(vec![looping(), looping()]);
        let lookups = FakeLookups::default();
        let config = AgentConfig {
            max_steps: 2,
            ..AgentConfig::default()
        };

        let steps = run_message(
            &provider,
            &lookups,
            &KnowledgeContext::bau(),
            "keep searching",
            &config,
        )
        .await
        .expect("bounded run");

        assert_eq!(steps.len(), 4);
        assert!(!steps.iter().any(|s| matches!(s, AgentStep::Final { .. })));
        assert_eq!(extract_final_answer(&steps), FinalAnswer::NoAnswerProduced);
        assert_eq!(provider.inputs().len(), 2);
    }

    #[tokio::test]
    async fn campus_answer_without_weather_gets_forced_precaution() {
        let provider = FakeProvider::new(vec![
            text("The rickshaw fare is 30 tk."),
            text("The rickshaw fare is 30 tk. Light rain today, carry an umbrella."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(
            &provider,
            &lookups,
            "What is the rickshaw fare from Jabbar er Mor to Town Hall Mor?",
        )
        .await
        .expect("answer");

        assert_eq!(
            steps,
            vec![
                AgentStep::Reasoning {
                    text: "The rickshaw fare is 30 tk.".to_string()
                },
                AgentStep::ToolCall {
                    id: "precaution-1".to_string(),
                    name: "weather".to_string(),
                    args_json: json!({"city": "Mymensingh"}),
                },
                AgentStep::ToolResult {
                    id: "precaution-1".to_string(),
                    name: "weather".to_string(),
                    content: "Weather in Mymensingh, BD:\n• Condition: Light rain".to_string(),
                },
                AgentStep::Final {
                    text: "The rickshaw fare is 30 tk. Light rain today, carry an umbrella."
                        .to_string()
                },
            ]
        );
        assert_eq!(lookups.calls(), vec!["weather:Mymensingh"]);

        let inputs = provider.inputs();
        let Some(ChatMessage::User { text }) = inputs[1].messages.last() else {
            panic!("expected precaution nudge");
        };
        assert!(text.contains("precaution"));
    }

    #[tokio::test]
    async fn campus_answer_on_single_step_budget_is_kept() {
        let provider = FakeProvider::new(vec![text("Rickshaw fare from KR Market to TSC is 10 BDT.")]);
        let lookups = FakeLookups::default();
        let config = AgentConfig {
            max_steps: 1,
            ..AgentConfig::default()
        };

        let steps = run_message(
            &provider,
            &lookups,
            &KnowledgeContext::bau(),
            "rickshaw fare KR Market to TSC?",
            &config,
        )
        .await
        .expect("answer");

        assert_eq!(
            steps,
            vec![AgentStep::Final {
                text: "Rickshaw fare from KR Market to TSC is 10 BDT.".to_string()
            }]
        );
        assert!(lookups.calls().is_empty());
    }

    #[tokio::test]
    async fn campus_answer_on_last_turn_is_kept() {
        let searching = || calls(None, vec![call("s", "search", json!({"query": "bus"}))]);
        let provider = FakeProvider::new(vec![
            searching(),
            searching(),
            searching(),
            searching(),
            searching(),
            text("Bus leaves at 7:05 am."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, "When does the bus leave?")
            .await
            .expect("answer");

        assert_eq!(
            extract_final_answer(&steps),
            FinalAnswer::Text("Bus leaves at 7:05 am.".to_string())
        );
        assert!(!lookups.calls().iter().any(|c| c.starts_with("weather:")));
        assert_eq!(provider.inputs().len(), 6);
    }

    #[tokio::test]
    async fn campus_answer_with_model_weather_is_not_forced_again() {
        let provider = FakeProvider::new(vec![
            calls(None, vec![call("w1", "weather", json!({"city": "Mymensingh"}))]),
            text("Next bus leaves at 7:05 am. Skies are clear."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, "When is the first bus to town?")
            .await
            .expect("answer");

        let weather_calls = steps
            .iter()
            .filter(|s| matches!(s, AgentStep::ToolCall { name, .. } if name == "weather"))
            .count();
        assert_eq!(weather_calls, 1);
        assert!(matches!(steps.last(), Some(AgentStep::Final { .. })));
    }

    #[tokio::test]
    async fn precaution_enforcement_can_be_disabled() {
        let provider = FakeProvider::new(vec![text("The bus leaves at 7:05 am.")]);
        let lookups = FakeLookups::default();
        let config = AgentConfig {
            enforce_weather_precaution: false,
            ..AgentConfig::default()
        };

        let steps = run_message(
            &provider,
            &lookups,
            &KnowledgeContext::bau(),
            "When is the first bus?",
            &config,
        )
        .await
        .expect("answer");

        assert_eq!(
            steps,
            vec![AgentStep::Final {
                text: "The bus leaves at 7:05 am.".to_string()
            }]
        );
        assert!(lookups.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_arguments_are_fed_back_to_the_model() {
        let provider = FakeProvider::new(vec![
            calls(None, vec![call("c1", "weather", json!({"town": "Dhaka"}))]),
            calls(None, vec![call("c2", "weather", json!({"city": "Dhaka"}))]),
            text("Cloudy in Dhaka."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, "weather in dhaka")
            .await
            .expect("answer");

        let AgentStep::ToolResult { content, .. } = &steps[1] else {
            panic!("expected tool result");
        };
        assert!(content.starts_with("Error: invalid arguments:"), "{content}");
        assert_eq!(lookups.calls(), vec!["weather:Dhaka"]);
        assert_eq!(steps.len(), 5);
    }

    #[tokio::test]
    async fn one_tool_call_per_turn_and_text_is_reasoning() {
        let provider = FakeProvider::new(vec![
            calls(
                Some("Let me check the weather first."),
                vec![
                    call("c1", "weather", json!({"city": "Dhaka"})),
                    call("c2", "search", json!({"query": "Dhaka news"})),
                ],
            ),
            text("Dhaka has light rain."),
        ]);
        let lookups = FakeLookups::default();

        let steps = run(&provider, &lookups, "Dhaka today?").await.expect("answer");

        assert_eq!(
            steps[0],
            AgentStep::Reasoning {
                text: "Let me check the weather first.".to_string()
            }
        );
        assert_eq!(lookups.calls(), vec!["weather:Dhaka"]);

        let inputs = provider.inputs();
        let recorded = inputs[1]
            .messages
            .iter()
            .find_map(|m| match m {
                ChatMessage::Assistant { tool_calls, .. } => Some(tool_calls.len()),
                _ => None,
            })
            .expect("assistant message");
        assert_eq!(recorded, 1);
    }

    #[tokio::test]
    async fn empty_reply_gets_one_repair_prompt() {
        let provider = FakeProvider::new(vec![empty(), text("Hello!")]);

        let steps = run(&provider, &FakeLookups::default(), "hi")
            .await
            .expect("answer");

        assert_eq!(
            steps,
            vec![AgentStep::Final {
                text: "Hello!".to_string()
            }]
        );
        let inputs = provider.inputs();
        assert!(matches!(
            inputs[1].messages.last(),
            Some(ChatMessage::User { text }) if text.contains("previous response was empty")
        ));
    }

    #[tokio::test]
    async fn repeated_empty_replies_produce_no_answer() {
        let provider = FakeProvider::new(vec![empty(), empty()]);

        let steps = run(&provider, &FakeLookups::default(), "hi")
            .await
            .expect("bounded");

        assert!(steps.is_empty());
        assert_eq!(extract_final_answer(&steps), FinalAnswer::NoAnswerProduced);
    }

    #[tokio::test]
    async fn events_mirror_returned_steps() {
        let provider = FakeProvider::new(vec![
            calls(None, vec![call("c1", "search", json!({"query": "BAU"}))]),
            text("BAU is in Mymensingh."),
        ]);
        let config = AgentConfig {
            enforce_weather_precaution: false,
            ..AgentConfig::default()
        };
        let mut seen = Vec::new();

        let steps = run_message_with_events(
            &provider,
            &FakeLookups::default(),
            &KnowledgeContext::bau(),
            "Where is BAU?",
            &config,
            &mut |step: &AgentStep| seen.push(step.clone()),
        )
        .await
        .expect("answer");

        assert_eq!(seen, steps);
    }

    #[test]
    fn steps_display_for_trace() {
        assert_eq!(
            AgentStep::ToolCall {
                id: "c1".to_string(),
                name: "weather".to_string(),
                args_json: json!({"city": "Dhaka"}),
            }
            .to_string(),
            r#"tool call [c1] weather {"city":"Dhaka"}"#
        );
        assert_eq!(
            AgentStep::Final {
                text: "done".to_string()
            }
            .to_string(),
            "final: done"
        );
    }
}
