//! Top-level planning errors and their Markdown rendering

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::ValidationErrors;
use crate::llm::LlmError;
use crate::tools::ToolFailure;

/// Everything that can end a planning request
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("model backend unavailable: {0}")]
    BackendUnavailable(#[source] LlmError),

    #[error("No response from the model. Please check the configuration.")]
    EmptyResponse,

    #[error("model backend sent an unreadable response: {0}")]
    InvalidResponse(#[source] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolFailure),

    #[error("prompt error: {0}")]
    Prompt(String),
}

impl From<LlmError> for PlanError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyResponse => PlanError::EmptyResponse,
            LlmError::Config(e) => PlanError::Configuration(e),
            e @ LlmError::InvalidResponse(_) => PlanError::InvalidResponse(e),
            other => PlanError::BackendUnavailable(other),
        }
    }
}

impl PlanError {
    /// Render for display in place of a travel plan
    pub fn to_markdown(&self) -> String {
        match self {
            PlanError::Validation(errors) => errors.to_markdown(),
            other => format!(
                "**Error:** An error occurred while planning your trip: {}\n\nPlease try again or check your inputs.",
                other
            ),
        }
    }
}
