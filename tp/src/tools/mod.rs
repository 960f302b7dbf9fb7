//! Tool system: the trait, the built-in travel tools, and the dispatcher

pub mod builtin;
mod context;
mod dispatcher;
mod error;
mod traits;

pub use context::ToolContext;
pub use dispatcher::ToolDispatcher;
#[cfg(test)]
pub(crate) use dispatcher::testing;
pub use error::{ToolError, ToolFailure};
pub use traits::{Tool, ToolOutput, ToolResult};
