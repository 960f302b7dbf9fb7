//! Ollama chat client
//!
//! Ollama models are not assumed to support native function calling. Tools
//! are described to the model in the system message, and a reply of the form
//! `{"tool": "<name>", "arguments": {...}}` is turned into a tool call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};
use crate::config::ResolvedLlmConfig;

/// Correlation id given to the single tool call a text-mode reply can carry
pub const OLLAMA_TOOL_CALL_ID: &str = "ollama-tool-1";

/// Ollama chat API client
pub struct OllamaClient {
    model: String,
    base_url: String,
    http: Client,
}

impl OllamaClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(name = %config.name, model = %config.model, "OllamaClient::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Unavailable)?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            http,
        })
    }

    /// Build the request body for the Ollama chat API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, message_count = request.messages.len(), "build_request_body: called");
        let protocol = (!request.tools.is_empty()).then(|| tool_protocol_prompt(&request.tools));

        let mut messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect();

        if let Some(protocol) = protocol {
            match request.messages.iter().position(|m| m.role == Role::System) {
                Some(idx) => {
                    debug!("build_request_body: appending tool protocol to system message");
                    messages[idx]["content"] =
                        serde_json::json!(format!("{}\n\n{}", request.messages[idx].content, protocol));
                }
                None => {
                    debug!("build_request_body: no system message, inserting tool protocol");
                    messages.insert(0, serde_json::json!({ "role": "system", "content": protocol }));
                }
            }
        }

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        })
    }

    /// Parse the chat response, detecting a text-mode tool call
    fn parse_response(&self, api_response: OllamaResponse, tools_offered: bool) -> Result<CompletionResponse, LlmError> {
        debug!(tools_offered, "parse_response: called");
        let message = api_response.message.ok_or_else(|| {
            debug!("parse_response: no message");
            LlmError::EmptyResponse
        })?;

        let usage = TokenUsage {
            input_tokens: api_response.prompt_eval_count.unwrap_or(0),
            output_tokens: api_response.eval_count.unwrap_or(0),
        };

        let stop_reason = match api_response.done_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        if tools_offered && let Some(call) = parse_tool_call(&message.content) {
            debug!(tool_name = %call.name, "parse_response: reply is a tool call");
            return Ok(CompletionResponse {
                content: Some(message.content),
                tool_calls: vec![call],
                stop_reason: StopReason::ToolUse,
                usage,
            });
        }

        Ok(CompletionResponse {
            content: Some(message.content),
            tool_calls: vec![],
            stop_reason,
            usage,
        })
    }
}

/// Instructions appended to the system message when tools are available
fn tool_protocol_prompt(tools: &[ToolDefinition]) -> String {
    let catalog: Vec<_> = tools.iter().map(|t| t.to_openai_schema()).collect();
    let catalog = serde_json::to_string_pretty(&catalog).unwrap_or_else(|_| "[]".to_string());
    format!(
        "TOOLS AVAILABLE:\n{}\n\n\
         If you need to use a tool, respond ONLY with JSON in the format:\n\
         {{\"tool\": \"<tool_name>\", \"arguments\": {{ ... }}}}\n\
         Otherwise, respond with your final travel plan in Markdown.",
        catalog
    )
}

/// Interpret a reply as `{"tool": name, "arguments": {...}}`
fn parse_tool_call(reply: &str) -> Option<ToolCall> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let name = value.get("tool")?.as_str()?;
    let input = value.get("arguments").cloned().unwrap_or(serde_json::json!({}));
    Some(ToolCall::new(OLLAMA_TOOL_CALL_ID, name, input))
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, message_count = request.messages.len(), "complete: called");
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(&request);

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            debug!(error = %e, "complete: failed to connect to Ollama");
            LlmError::Unavailable(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let text = response.text().await?;
        let api_response: OllamaResponse = serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, body_len = text.len(), "complete: unreadable response body");
            LlmError::InvalidResponse(e.to_string())
        })?;
        self.parse_response(api_response, !request.tools.is_empty())
    }

    fn provider(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
    done_reason: Option<String>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::llm::client::mock::{closed_port, serve_once};

    fn client() -> OllamaClient {
        client_at("http://localhost:11434")
    }

    fn client_at(base_url: &str) -> OllamaClient {
        OllamaClient {
            model: "llama2".to_string(),
            base_url: base_url.to_string(),
            http: Client::new(),
        }
    }

    fn weather_tool() -> ToolDefinition {
        ToolDefinition::new("get_weather", "Forecast for a city", serde_json::json!({"type": "object"}))
    }

    fn request(tools: Vec<ToolDefinition>) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::system("You are a travel planner."), Message::user("Plan Lisbon")],
            tools,
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_build_request_body_without_tools() {
        let body = client().build_request_body(&request(vec![]));
        assert_eq!(body["model"], "llama2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["content"], "You are a travel planner.");
        assert_eq!(body["options"]["num_predict"], 2000);
    }

    #[test]
    fn test_build_request_body_appends_tool_protocol() {
        let body = client().build_request_body(&request(vec![weather_tool()]));
        let system = body["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("You are a travel planner."));
        assert!(system.contains("TOOLS AVAILABLE"));
        assert!(system.contains("get_weather"));
        assert!(system.contains("respond ONLY with JSON"));
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tool_messages_sent_with_tool_role() {
        let mut req = request(vec![]);
        req.messages.push(Message::tool_result(OLLAMA_TOOL_CALL_ID, "{\"temperature\": 21}"));
        let body = client().build_request_body(&req);
        assert_eq!(body["messages"][2]["role"], "tool");
    }

    #[test]
    fn test_parse_tool_call_plain_and_fenced() {
        let call = parse_tool_call(r#"{"tool": "get_weather", "arguments": {"destination_city": "Lisbon"}}"#).unwrap();
        assert_eq!(call.id, OLLAMA_TOOL_CALL_ID);
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.input["destination_city"], "Lisbon");

        let fenced = "```json\n{\"tool\": \"generate_image\", \"arguments\": {}}\n```";
        assert_eq!(parse_tool_call(fenced).unwrap().name, "generate_image");
    }

    #[test]
    fn test_parse_tool_call_rejects_prose() {
        assert!(parse_tool_call("# Lisbon Travel Plan\n\nDay 1...").is_none());
        assert!(parse_tool_call(r#"{"plan": "not a tool"}"#).is_none());
    }

    #[test]
    fn test_parse_response_tool_call_only_when_offered() {
        let raw = || OllamaResponse {
            message: Some(OllamaMessage {
                content: r#"{"tool": "get_weather", "arguments": {"destination_city": "Lisbon"}}"#.to_string(),
            }),
            done_reason: Some("stop".to_string()),
            prompt_eval_count: Some(50),
            eval_count: Some(10),
        };

        let with_tools = client().parse_response(raw(), true).unwrap();
        assert_eq!(with_tools.tool_calls.len(), 1);
        assert_eq!(with_tools.stop_reason, StopReason::ToolUse);
        assert_eq!(with_tools.usage.input_tokens, 50);

        let without_tools = client().parse_response(raw(), false).unwrap();
        assert!(without_tools.tool_calls.is_empty());
        assert!(without_tools.content.unwrap().contains("get_weather"));
    }

    #[test]
    fn test_parse_response_missing_message() {
        let raw = OllamaResponse {
            message: None,
            done_reason: None,
            prompt_eval_count: None,
            eval_count: None,
        };
        assert!(matches!(client().parse_response(raw, true), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_complete_reads_reply() {
        let base = serve_once(
            "200 OK",
            r#"{"message": {"role": "assistant", "content": "Lisbon plan"}, "done_reason": "stop", "eval_count": 12}"#,
        )
        .await;

        let response = client_at(&base).complete(request(vec![])).await.unwrap();

        assert_eq!(response.content.as_deref(), Some("Lisbon plan"));
        assert_eq!(response.usage.output_tokens, 12);
    }

    #[tokio::test]
    async fn test_complete_unreadable_body_is_invalid_response() {
        let base = serve_once("200 OK", "not json!").await;

        let err = client_at(&base).complete(request(vec![])).await.unwrap_err();

        assert!(matches!(err, LlmError::InvalidResponse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_complete_http_error_is_api_error() {
        let base = serve_once("500 Internal Server Error", r#"{"error": "model not loaded"}"#).await;

        let err = client_at(&base).complete(request(vec![])).await.unwrap_err();

        match err {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("model not loaded"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_connect_failure_is_unavailable() {
        let base = closed_port().await;

        let err = client_at(&base).complete(request(vec![])).await.unwrap_err();

        assert!(matches!(err, LlmError::Unavailable(_)), "got {:?}", err);
    }
}
