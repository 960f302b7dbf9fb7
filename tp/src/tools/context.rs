//! ToolContext - execution context for tools

use chrono::NaiveDate;
use tracing::debug;

/// Execution context for tools - scoped to a single planning request
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Trip request id (for log correlation)
    pub trip_id: String,

    /// Date the request is being planned on
    pub today: NaiveDate,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(trip_id: impl Into<String>, today: NaiveDate) -> Self {
        let trip_id = trip_id.into();
        debug!(%trip_id, %today, "ToolContext::new: called");
        Self { trip_id, today }
    }
}
