//! Bounded tool-calling loop between the language model and the tool registry.
//!
//! The loop is a small state machine:
//!
//! ```text
//! AwaitingModel { round, offer_tools } --tool calls--> ExecutingTools { round, response }
//!        ^                                                   |
//!        +------------------- round + 1 ---------------------+
//! AwaitingModel --answer--> Finalized
//! ```
//!
//! Once `max_tool_rounds` tool rounds have run, the next model call is made
//! without tool schemas, so a query costs at most `max_tool_rounds + 1` calls.

use super::prompt;
use crate::tools::ToolRegistry;
use crate::types::Source;
use std::sync::Arc;
use syllabus_core::{AppResult, RagSettings};
use syllabus_llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, ToolSchema};

/// Model parameters for one orchestrated query.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_tool_rounds: usize,
}

impl OrchestratorSettings {
    pub fn from_settings(model: impl Into<String>, settings: &RagSettings) -> Self {
        Self {
            model: model.into(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_tool_rounds: settings.max_tool_rounds,
        }
    }
}

/// Final answer of an orchestrated query.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub answer: String,

    /// Sources reported by the last provenance-tracking tool call
    pub sources: Vec<Source>,

    pub model_calls: usize,
    pub tool_rounds: usize,
}

enum State<'a> {
    AwaitingModel {
        round: usize,
        offer_tools: bool,
    },
    ExecutingTools {
        round: usize,
        response: ChatResponse,
        registry: &'a ToolRegistry,
    },
    Finalized {
        answer: String,
    },
}

/// Drives a query through the model and its tools.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    tools: Option<Arc<ToolRegistry>>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Option<Arc<ToolRegistry>>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    /// Answer `query`, with optional formatted conversation history.
    ///
    /// Tool problems reach the model as text. Provider failures and calls to
    /// unknown tools abort the query.
    pub async fn run(&self, query: &str, history: Option<&str>) -> AppResult<Completion> {
        let system = prompt::system_prompt(history, self.settings.max_tool_rounds)?;
        let schemas: Vec<ToolSchema> = self
            .tools
            .as_ref()
            .map(|registry| registry.definitions())
            .unwrap_or_default();

        let mut messages = vec![ChatMessage::user(prompt::user_prompt(query))];
        let mut sources: Vec<Source> = Vec::new();
        let mut model_calls = 0;
        let mut tool_rounds = 0;

        let mut state = State::AwaitingModel {
            round: 0,
            offer_tools: !schemas.is_empty() && self.settings.max_tool_rounds > 0,
        };

        loop {
            state = match state {
                State::AwaitingModel { round, offer_tools } => {
                    let mut request = ChatRequest::new(&self.settings.model, messages.clone())
                        .with_system(system.as_str())
                        .with_temperature(self.settings.temperature)
                        .with_max_tokens(self.settings.max_tokens);
                    if offer_tools {
                        request = request.with_tools(schemas.clone());
                    }

                    let response = self.llm.chat(&request).await?;
                    model_calls += 1;

                    tracing::debug!(
                        "Model call {} (round {}, tools offered: {}, tool calls: {})",
                        model_calls,
                        round,
                        offer_tools,
                        response.tool_calls.len()
                    );

                    match self.tools.as_deref() {
                        Some(registry) if offer_tools && response.wants_tools() => {
                            State::ExecutingTools {
                                round,
                                response,
                                registry,
                            }
                        }
                        _ => State::Finalized {
                            answer: response.content,
                        },
                    }
                }

                State::ExecutingTools {
                    round,
                    response,
                    registry,
                } => {
                    messages.push(ChatMessage::assistant(&response));

                    let mut results = Vec::with_capacity(response.tool_calls.len());
                    for call in &response.tool_calls {
                        let output = registry.execute(&call.name, call.arguments.clone()).await?;
                        if let Some(reported) = output.sources {
                            sources = reported;
                        }
                        results.push((call.id.clone(), output.text));
                    }
                    messages.push(ChatMessage::tool_results(results));

                    tool_rounds += 1;
                    let round = round + 1;
                    State::AwaitingModel {
                        round,
                        offer_tools: round < self.settings.max_tool_rounds,
                    }
                }

                State::Finalized { answer } => {
                    tracing::info!(
                        "Answered in {} model call(s), {} tool round(s), {} source(s)",
                        model_calls,
                        tool_rounds,
                        sources.len()
                    );

                    return Ok(Completion {
                        answer,
                        sources,
                        model_calls,
                        tool_rounds,
                    });
                }
            };
        }
    }
}
