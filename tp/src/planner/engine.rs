//! TripPlanner - the bounded tool-calling loop

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::domain::TripDetails;
use crate::error::PlanError;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, TokenUsage, ToolCall, ToolDefinition};
use crate::prompts::PromptBuilder;
use crate::tools::{ToolContext, ToolDispatcher, ToolResult};

/// Where the loop is between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    AwaitingFirstResponse,
    /// Follow-up round `round` (1-based) is about to be sent
    AwaitingFollowUp { round: u32 },
    Done,
}

/// Request parameters shared by every round
#[derive(Debug, Clone, Copy)]
pub struct PlannerSettings {
    pub max_tool_rounds: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PlannerSettings {
    pub fn new(planner: &PlannerConfig, max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tool_rounds: planner.max_tool_rounds,
            max_tokens,
            temperature,
        }
    }
}

/// One executed tool call, for logs and the CLI summary
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallSummary {
    pub tool_name: String,
    pub arguments: String,
    pub result_len: usize,
}

/// Result of a completed plan
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Final Markdown from the model, followed by any tool attachments
    pub markdown: String,
    /// Model round-trips performed
    pub rounds: u32,
    pub tool_calls: Vec<ToolCallSummary>,
    /// Reader-only Markdown produced by tools (generated images), in call order
    pub attachments: Vec<String>,
    pub usage: TokenUsage,
}

/// Runs the prompt, tools, follow-up sequence for one trip
pub struct TripPlanner {
    llm: Arc<dyn LlmClient>,
    dispatcher: Arc<ToolDispatcher>,
    prompts: Arc<PromptBuilder>,
    settings: PlannerSettings,
}

impl TripPlanner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        dispatcher: Arc<ToolDispatcher>,
        prompts: Arc<PromptBuilder>,
        settings: PlannerSettings,
    ) -> Self {
        debug!(provider = %llm.provider(), ?settings, "TripPlanner::new: called");
        Self {
            llm,
            dispatcher,
            prompts,
            settings,
        }
    }

    /// Plan a trip
    pub async fn plan(&self, trip: &TripDetails, ctx: &ToolContext) -> Result<PlanOutcome, PlanError> {
        debug!(trip_id = %ctx.trip_id, destination = %trip.destination(), "TripPlanner::plan: called");
        let mut state = PlanState::AwaitingFirstResponse;
        let tool_defs = if self.tools_offered(state) {
            self.dispatcher.definitions()
        } else {
            Vec::new()
        };
        let mut messages = self
            .prompts
            .build(trip, &tool_defs)
            .map_err(|e| PlanError::Prompt(e.to_string()))?;

        let mut rounds = 0;
        let mut usage = TokenUsage::default();
        let mut summaries = Vec::new();
        let mut attachments: Vec<String> = Vec::new();

        loop {
            let offer_tools = self.tools_offered(state);
            debug!(trip_id = %ctx.trip_id, ?state, offer_tools, "TripPlanner::plan: round start");

            let tools = if offer_tools { tool_defs.clone() } else { Vec::new() };
            let response = self.send(&messages, tools).await?;
            rounds += 1;
            usage.add(response.usage);

            if !offer_tools || !response.has_tool_calls() {
                if response.has_tool_calls() {
                    warn!(trip_id = %ctx.trip_id, count = response.tool_calls.len(), "Ignoring tool calls in final round");
                }
                let markdown = with_attachments(final_text(&response)?, &attachments);
                state = PlanState::Done;
                info!(
                    trip_id = %ctx.trip_id,
                    rounds,
                    ?state,
                    attachments = attachments.len(),
                    total_tokens = usage.total(),
                    "plan complete"
                );
                return Ok(PlanOutcome {
                    markdown,
                    rounds,
                    tool_calls: summaries,
                    attachments,
                    usage,
                });
            }

            debug!(trip_id = %ctx.trip_id, tool_count = response.tool_calls.len(), "TripPlanner::plan: LLM requested tool use");
            let results = self.dispatcher.dispatch_all(&response.tool_calls, ctx).await?;
            summaries.extend(summarize(&response.tool_calls, &results));
            attachments.extend(results.iter().filter_map(|r| r.attachment.clone()));

            messages.push(build_assistant_message(&response, &results));
            messages.extend(results.iter().map(ToolResult::to_message));

            state = match state {
                PlanState::AwaitingFirstResponse => PlanState::AwaitingFollowUp { round: 1 },
                PlanState::AwaitingFollowUp { round } => PlanState::AwaitingFollowUp { round: round + 1 },
                PlanState::Done => PlanState::Done,
            };
        }
    }

    /// Tools go out on every round except the last permitted one
    fn tools_offered(&self, state: PlanState) -> bool {
        let max = self.settings.max_tool_rounds;
        match state {
            PlanState::AwaitingFirstResponse => max > 0,
            PlanState::AwaitingFollowUp { round } => round < max,
            PlanState::Done => false,
        }
    }

    async fn send(&self, messages: &[Message], tools: Vec<ToolDefinition>) -> Result<CompletionResponse, PlanError> {
        debug!(message_count = messages.len(), tool_count = tools.len(), "TripPlanner::send: called");
        let request = CompletionRequest {
            messages: messages.to_vec(),
            tools,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        match self.llm.complete(request).await {
            Ok(response) => {
                debug!(stop_reason = ?response.stop_reason, "TripPlanner::send: LLM response received");
                Ok(response)
            }
            Err(e) => {
                debug!(error = %e, "TripPlanner::send: LLM error");
                Err(e.into())
            }
        }
    }
}

fn final_text(response: &CompletionResponse) -> Result<String, PlanError> {
    response
        .text_content()
        .map(str::to_string)
        .ok_or(PlanError::EmptyResponse)
}

fn with_attachments(markdown: String, attachments: &[String]) -> String {
    if attachments.is_empty() {
        return markdown;
    }
    format!("{}\n\n{}", markdown.trim_end(), attachments.join("\n\n"))
}

/// Assistant turn carrying only the tool calls that produced a result
///
/// Every tool call in the history must be answered by a tool message.
fn build_assistant_message(response: &CompletionResponse, results: &[ToolResult]) -> Message {
    debug!(tool_calls = response.tool_calls.len(), result_count = results.len(), "build_assistant_message: called");
    let answered: Vec<ToolCall> = response
        .tool_calls
        .iter()
        .filter(|call| results.iter().any(|r| r.call_id == call.id))
        .cloned()
        .collect();
    let text = response.content.clone().unwrap_or_default();

    if answered.is_empty() {
        debug!("build_assistant_message: no answered tool calls");
        Message::assistant(text)
    } else {
        Message::assistant_with_tools(text, answered)
    }
}

fn summarize(calls: &[ToolCall], results: &[ToolResult]) -> Vec<ToolCallSummary> {
    results
        .iter()
        .filter_map(|result| {
            let call = calls.iter().find(|c| c.id == result.call_id)?;
            Some(ToolCallSummary {
                tool_name: result.tool_name.clone(),
                arguments: call.input.to_string(),
                result_len: result.content.len(),
            })
        })
        .collect()
}
