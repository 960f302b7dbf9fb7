//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call carries the whole conversation
///
/// The planner owns the message list and sends it in full every round; a
/// client never remembers anything between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one completion request and wait for the full response
    ///
    /// Returns final text, tool calls, or both. No retries are attempted.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Backend name for logs ("openai", "ollama", ...)
    fn provider(&self) -> &'static str;
}
