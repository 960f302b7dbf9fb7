//! Tool error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{0}")]
    NoData(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A known tool failed; fatal to the planning request
#[derive(Debug, Error)]
#[error("tool '{tool}' failed: {source}")]
pub struct ToolFailure {
    pub tool: String,
    pub call_id: String,
    #[source]
    pub source: ToolError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message() {
        let err = ToolError::Upstream {
            service: "OpenWeatherMap",
            status: 404,
            message: "city not found".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("OpenWeatherMap"));
        assert!(msg.contains("404"));
        assert!(msg.contains("city not found"));
    }

    #[test]
    fn test_tool_failure_names_tool() {
        let failure = ToolFailure {
            tool: "get_weather".to_string(),
            call_id: "call_1".to_string(),
            source: ToolError::Config(ConfigError::MissingApiKey {
                env: "OPEN_WEATHER_API_KEY".to_string(),
            }),
        };

        let msg = failure.to_string();
        assert!(msg.contains("get_weather"));
        assert!(msg.contains("OPEN_WEATHER_API_KEY"));
    }
}
