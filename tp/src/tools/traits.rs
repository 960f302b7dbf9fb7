//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ToolContext, ToolError};
use crate::llm::Message;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the function name the LLM emits)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool, returning text or serialized JSON for the model
    ///
    /// An error here aborts the whole planning request.
    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// What a tool produced
///
/// `content` goes back to the model. `attachment` is Markdown for the reader
/// only and is appended to the final plan without passing through the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub attachment: Option<String>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(content: impl Into<String>, attachment: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: Some(attachment.into()),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(content: String) -> Self {
        Self::text(content)
    }
}

/// Result of one tool call, correlated back to the call id
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub content: String,
    pub attachment: Option<String>,
}

impl ToolResult {
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            attachment: None,
        }
    }

    pub fn from_output(call_id: impl Into<String>, tool_name: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: output.content,
            attachment: output.attachment,
        }
    }

    /// Package as a tool message for the next round
    pub fn to_message(&self) -> Message {
        debug!(call_id = %self.call_id, "ToolResult::to_message: called");
        Message::tool_result(&self.call_id, &self.content)
    }
}

/// Read a required string argument
pub(crate) fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArgument(format!("{} is required", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_tool_result_to_message() {
        let result = ToolResult::new("call_7", "get_weather", "{\"temperature\": 12}");
        let msg = result.to_message();
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(msg.content, "{\"temperature\": 12}");
    }

    #[test]
    fn test_attachment_stays_out_of_message() {
        let output = ToolOutput::with_attachment("image generated for Oslo", "![Oslo](data:image/png;base64,AAAA)");
        let result = ToolResult::from_output("call_8", "generate_image", output);

        let msg = result.to_message();
        assert_eq!(msg.content, "image generated for Oslo");
        assert!(!msg.content.contains("base64"));
        assert_eq!(result.attachment.as_deref(), Some("![Oslo](data:image/png;base64,AAAA)"));
    }

    #[test]
    fn test_required_str() {
        let input = serde_json::json!({"city": " Oslo ", "blank": "  ", "n": 3});
        assert_eq!(required_str(&input, "city").unwrap(), "Oslo");
        assert!(required_str(&input, "blank").is_err());
        assert!(required_str(&input, "n").is_err());
        let err = required_str(&input, "missing").unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: missing is required");
    }
}
