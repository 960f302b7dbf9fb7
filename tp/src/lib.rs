//! TripPlanner - LLM travel planner
//!
//! A trip request is validated, turned into a prompt, and sent to a model
//! that may ask for tools before writing a Markdown itinerary.
//!
//! # Modules
//!
//! - [`domain`] - Trip form validation and trip ids
//! - [`prompts`] - Handlebars prompt templates
//! - [`llm`] - LLM client trait with OpenAI and Ollama backends
//! - [`tools`] - Weather, image and currency tools plus the dispatcher
//! - [`planner`] - The bounded tool-calling loop
//! - [`app`] - Validation, wiring and Markdown error rendering
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod tools;

pub use app::App;
pub use config::Config;
pub use error::PlanError;
