//! Prompt Template System
//!
//! Renders `.pmt` (prompt template) files into the opening messages of a plan.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (configured override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax with HTML escaping disabled.

pub mod embedded;
mod builder;

pub use builder::{PromptBuilder, PromptContext};
