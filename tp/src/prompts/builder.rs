//! Prompt Builder
//!
//! Renders the system and user messages for a trip request.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{DATE_FORMAT, TripDetails};
use crate::llm::{Message, ToolDefinition};

const TEMPLATES: [&str; 2] = ["system", "user"];

/// One line of the tool catalog in the system prompt
#[derive(Debug, Clone, Serialize)]
struct ToolSummary {
    number: usize,
    name: String,
    description: String,
}

/// Values available to the templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub destination: String,
    pub travel_from: String,
    pub travel_to: String,
    pub nights: i64,
    pub travel_experience: String,
    pub spend_level: String,
    tools: Vec<ToolSummary>,
}

impl PromptContext {
    pub fn new(trip: &TripDetails, tools: &[ToolDefinition]) -> Self {
        debug!(destination = %trip.destination(), tool_count = tools.len(), "PromptContext::new: called");
        Self {
            destination: trip.destination().to_string(),
            travel_from: trip.travel_from().format(DATE_FORMAT).to_string(),
            travel_to: trip.travel_to().format(DATE_FORMAT).to_string(),
            nights: trip.nights(),
            travel_experience: trip.travel_experience().to_string(),
            spend_level: trip.spend_level().to_string(),
            tools: tools
                .iter()
                .enumerate()
                .map(|(i, t)| ToolSummary {
                    number: i + 1,
                    name: t.name.clone(),
                    description: t.description.clone(),
                })
                .collect(),
        }
    }
}

/// Loads the templates once and renders prompt messages
pub struct PromptBuilder {
    hbs: Handlebars<'static>,
}

impl PromptBuilder {
    /// Create a builder, letting `dir/{name}.pmt` override the embedded templates
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        debug!(?dir, "PromptBuilder::load: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);

        for name in TEMPLATES {
            let template = Self::load_template(dir, name)?;
            hbs.register_template_string(name, template)
                .map_err(|e| eyre!("Failed to parse prompt template {}: {}", name, e))?;
        }

        Ok(Self { hbs })
    }

    /// Create a builder that only uses embedded prompts
    pub fn embedded_only() -> Result<Self> {
        debug!("PromptBuilder::embedded_only: called");
        Self::load(None)
    }

    fn load_template(dir: Option<&Path>, name: &str) -> Result<String> {
        debug!(?dir, %name, "PromptBuilder::load_template: called");
        if let Some(dir) = dir {
            let path: PathBuf = dir.join(format!("{}.pmt", name));
            if path.exists() {
                info!("Using prompt override: {}", path.display());
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptBuilder::load_template: no override");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render one template
    pub fn render(&self, name: &str, context: &PromptContext) -> Result<String> {
        debug!(%name, "PromptBuilder::render: called");
        self.hbs
            .render(name, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }

    /// Build the `[system, user]` opening messages
    pub fn build(&self, trip: &TripDetails, tools: &[ToolDefinition]) -> Result<Vec<Message>> {
        debug!(destination = %trip.destination(), "PromptBuilder::build: called");
        let context = PromptContext::new(trip, tools);
        let system = self.render("system", &context)?;
        let user = self.render("user", &context)?;
        Ok(vec![Message::system(system), Message::user(user)])
    }
}
