//! Loop controller
//!
//! Sends the opening prompt, runs any requested tools, and makes the
//! follow-up round(s) until the model answers in text.

mod engine;

pub use engine::{PlanOutcome, PlanState, PlannerSettings, ToolCallSummary, TripPlanner};
