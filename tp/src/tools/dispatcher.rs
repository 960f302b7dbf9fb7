//! ToolDispatcher - routes model tool calls to registered tools

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::builtin::{CurrencyTool, ImageTool, WeatherClient, WeatherTool};
use super::{Tool, ToolContext, ToolFailure, ToolResult};
use crate::config::ToolsConfig;
use crate::llm::{ToolCall, ToolDefinition};

/// Registry of the tools available to one planning request
pub struct ToolDispatcher {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolDispatcher {
    /// Create a dispatcher with the weather, image and currency tools
    pub fn standard(config: &ToolsConfig) -> Self {
        debug!("ToolDispatcher::standard: called");
        let weather = WeatherClient::new(&config.weather);

        let mut dispatcher = Self::empty();
        dispatcher.add_tool(Box::new(WeatherTool::new(weather.clone())));
        dispatcher.add_tool(Box::new(ImageTool::new(&config.image, weather)));
        dispatcher.add_tool(Box::new(CurrencyTool::new(&config.currency)));
        dispatcher
    }

    /// Create an empty dispatcher
    pub fn empty() -> Self {
        debug!("ToolDispatcher::empty: called");
        Self { tools: HashMap::new() }
    }

    /// Add a tool, replacing any tool with the same name
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolDispatcher::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool catalog for the LLM, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolDispatcher::definitions: called");
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute one tool call
    ///
    /// Returns `Ok(None)` for a tool name nobody registered.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &ToolContext) -> Result<Option<ToolResult>, ToolFailure> {
        debug!(trip_id = %ctx.trip_id, tool_name = %call.name, tool_id = %call.id, "ToolDispatcher::dispatch: called");
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(trip_id = %ctx.trip_id, tool_name = %call.name, "Unknown tool call: {}", call.name);
            return Ok(None);
        };

        match tool.execute(call.input.clone(), ctx).await {
            Ok(output) => {
                info!(
                    trip_id = %ctx.trip_id,
                    tool_name = %call.name,
                    content_len = output.content.len(),
                    has_attachment = output.attachment.is_some(),
                    "tool executed"
                );
                Ok(Some(ToolResult::from_output(&call.id, &call.name, output)))
            }
            Err(source) => {
                debug!(trip_id = %ctx.trip_id, tool_name = %call.name, error = %source, "ToolDispatcher::dispatch: tool failed");
                Err(ToolFailure {
                    tool: call.name.clone(),
                    call_id: call.id.clone(),
                    source,
                })
            }
        }
    }

    /// Execute tool calls in order, skipping unknown names
    ///
    /// The first failing tool aborts the batch.
    pub async fn dispatch_all(&self, calls: &[ToolCall], ctx: &ToolContext) -> Result<Vec<ToolResult>, ToolFailure> {
        debug!(count = %calls.len(), "ToolDispatcher::dispatch_all: called");
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            if let Some(result) = self.dispatch(call, ctx).await? {
                results.push(result);
            }
        }

        debug!(result_count = results.len(), "ToolDispatcher::dispatch_all: completed");
        Ok(results)
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::tools::{Tool, ToolContext, ToolError, ToolOutput};

    /// Tool stub that counts calls and echoes a fixed payload
    pub struct StubTool {
        pub name: &'static str,
        pub output: &'static str,
        pub attachment: Option<&'static str>,
        pub calls: Arc<AtomicUsize>,
        pub fail: bool,
    }

    impl StubTool {
        pub fn new(name: &'static str, output: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    output,
                    attachment: None,
                    calls: calls.clone(),
                    fail: false,
                },
                calls,
            )
        }

        pub fn failing(name: &'static str) -> Self {
            Self {
                name,
                output: "",
                attachment: None,
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            }
        }

        /// Also hand back reader-only Markdown
        pub fn with_attachment(mut self, attachment: &'static str) -> Self {
            self.attachment = Some(attachment);
            self
        }
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "stub tool"
        }

        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn execute(&self, _input: Value, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ToolError::NoData("stub failure".to_string()));
            }
            Ok(ToolOutput {
                content: self.output.to_string(),
                attachment: self.attachment.map(str::to_string),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::NaiveDate;

    use super::testing::StubTool;
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new("abc123-trip-paris", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap())
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall::new(id, name, serde_json::json!({}))
    }

    #[test]
    fn test_standard_dispatcher_has_travel_tools() {
        let dispatcher = ToolDispatcher::standard(&ToolsConfig::default());

        assert!(dispatcher.has_tool("get_weather"));
        assert!(dispatcher.has_tool("generate_image"));
        assert!(dispatcher.has_tool("convert_currency"));
        assert_eq!(
            dispatcher.tool_names(),
            vec!["convert_currency", "generate_image", "get_weather"]
        );
    }

    #[test]
    fn test_definitions_sorted() {
        let defs = ToolDispatcher::standard(&ToolsConfig::default()).definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["convert_currency", "generate_image", "get_weather"]);
        assert!(defs.iter().all(|d| d.input_schema["type"] == "object"));
    }

    #[tokio::test]
    async fn test_unknown_tool_skipped_and_rest_continue() {
        let (weather, weather_calls) = StubTool::new("get_weather", "{\"temperature\": 20}");
        let mut dispatcher = ToolDispatcher::empty();
        dispatcher.add_tool(Box::new(weather));

        let calls = vec![call("call_1", "book_flight"), call("call_2", "get_weather")];
        let results = dispatcher.dispatch_all(&calls, &ctx()).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].call_id, "call_2");
        assert_eq!(results[0].tool_name, "get_weather");
        assert_eq!(results[0].content, "{\"temperature\": 20}");
        assert_eq!(weather_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_returns_none() {
        let dispatcher = ToolDispatcher::empty();
        let result = dispatcher.dispatch(&call("call_1", "teleport"), &ctx()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_fatal() {
        let (weather, weather_calls) = StubTool::new("get_weather", "{}");
        let mut dispatcher = ToolDispatcher::empty();
        dispatcher.add_tool(Box::new(StubTool::failing("generate_image")));
        dispatcher.add_tool(Box::new(weather));

        let calls = vec![call("call_1", "generate_image"), call("call_2", "get_weather")];
        let failure = dispatcher.dispatch_all(&calls, &ctx()).await.unwrap_err();

        assert_eq!(failure.tool, "generate_image");
        assert_eq!(failure.call_id, "call_1");
        assert_eq!(weather_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_keep_call_order() {
        let (a, _) = StubTool::new("get_weather", "sunny");
        let (b, _) = StubTool::new("convert_currency", "42.0");
        let mut dispatcher = ToolDispatcher::empty();
        dispatcher.add_tool(Box::new(a));
        dispatcher.add_tool(Box::new(b));

        let calls = vec![call("c1", "convert_currency"), call("c2", "get_weather")];
        let results = dispatcher.dispatch_all(&calls, &ctx()).await.unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
