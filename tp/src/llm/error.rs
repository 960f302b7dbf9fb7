//! LLM error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during LLM operations
///
/// Nothing here is retried; every error ends the planning request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model backend unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Model returned no choices")]
    EmptyResponse,

    /// The backend answered but the body could not be read as its API format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
