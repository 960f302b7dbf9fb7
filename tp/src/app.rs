//! App - validates a trip form, wires the planner, renders the result

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{TripForm, generate_trip_id};
use crate::error::PlanError;
use crate::llm::{LlmClient, create_client};
use crate::planner::{PlanOutcome, PlannerSettings, TripPlanner};
use crate::prompts::PromptBuilder;
use crate::tools::{ToolContext, ToolDispatcher};

/// Top-level entry point for planning trips
pub struct App {
    config: Config,
    dispatcher: Arc<ToolDispatcher>,
    prompts: Arc<PromptBuilder>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl App {
    /// Create an app with the standard tools and the configured prompts
    pub fn new(config: Config) -> eyre::Result<Self> {
        debug!("App::new: called");
        let prompts = PromptBuilder::load(config.prompts.dir.as_deref())?;
        let dispatcher = ToolDispatcher::standard(&config.tools);
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            prompts: Arc::new(prompts),
            llm: None,
        })
    }

    /// Use this client instead of building one from the model selector
    pub fn with_client(mut self, llm: Arc<dyn LlmClient>) -> Self {
        debug!(provider = %llm.provider(), "App::with_client: called");
        self.llm = Some(llm);
        self
    }

    /// Replace the tool registry
    pub fn with_dispatcher(mut self, dispatcher: ToolDispatcher) -> Self {
        debug!(tools = ?dispatcher.tool_names(), "App::with_dispatcher: called");
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Plan a trip and render the result or the failure as Markdown
    pub async fn plan_trip(&self, form: &TripForm) -> String {
        debug!(destination = %form.destination, "App::plan_trip: called");
        match self.try_plan(form).await {
            Ok(outcome) => outcome.markdown,
            Err(e) => {
                warn!(error = %e, "Trip planning failed");
                e.to_markdown()
            }
        }
    }

    /// Plan a trip, dated today
    pub async fn try_plan(&self, form: &TripForm) -> Result<PlanOutcome, PlanError> {
        self.try_plan_on(form, Local::now().date_naive()).await
    }

    /// Plan a trip as if today were `today`
    pub async fn try_plan_on(&self, form: &TripForm, today: NaiveDate) -> Result<PlanOutcome, PlanError> {
        debug!(%today, "App::try_plan_on: called");
        let trip = form.validate(today)?;

        let llm = match &self.llm {
            Some(llm) => llm.clone(),
            None => {
                let resolved = self.config.llm.resolve(trip.model())?;
                info!(model = %resolved.name, provider = %resolved.provider, "Using model");
                create_client(&resolved)?
            }
        };

        let trip_id = generate_trip_id(trip.destination());
        info!(%trip_id, destination = %trip.destination(), nights = trip.nights(), "Planning trip");
        let ctx = ToolContext::new(trip_id, today);

        let settings = PlannerSettings::new(&self.config.planner, self.config.llm.max_tokens, self.config.llm.temperature);
        let planner = TripPlanner::new(llm, self.dispatcher.clone(), self.prompts.clone(), settings);
        planner.plan(&trip, &ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    fn form(destination: &str, from: &str, to: &str) -> TripForm {
        TripForm {
            destination: destination.to_string(),
            travel_from: from.to_string(),
            travel_to: to.to_string(),
            travel_experience: "Cultural".to_string(),
            spend_level: "Budget".to_string(),
            model: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_model() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("unused")]));
        let app = App::new(Config::default()).unwrap().with_client(llm.clone());

        let err = app
            .try_plan_on(&form("", "2030-01-10", "2030-01-05"), today())
            .await
            .unwrap_err();

        assert_eq!(llm.call_count(), 0);
        let PlanError::Validation(errors) = &err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert_eq!(
            errors.messages(),
            &[
                "Destination city is required".to_string(),
                "Travel end date must be after start date".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_with_injected_client() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("# Lisbon plan")]));
        let app = App::new(Config::default()).unwrap().with_client(llm);

        let outcome = app
            .try_plan_on(&form("Lisbon", "2030-02-01", "2030-02-04"), today())
            .await
            .unwrap();

        assert_eq!(outcome.markdown, "# Lisbon plan");
        assert_eq!(outcome.rounds, 1);
    }

    #[tokio::test]
    async fn test_unknown_model_is_configuration_error() {
        let app = App::new(Config::default()).unwrap();
        let mut form = form("Lisbon", "2030-02-01", "2030-02-04");
        form.model = Some("gpt-9".to_string());

        let err = app.try_plan_on(&form, today()).await.unwrap_err();

        assert!(matches!(err, PlanError::Configuration(_)));
        assert!(err.to_markdown().starts_with("**Error:** An error occurred while planning your trip"));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let mut config = Config::default();
        config.llm.models.insert(
            "bard".to_string(),
            ModelConfig {
                provider: "bard".to_string(),
                model: "bard".to_string(),
                api_key_env: None,
                base_url: "http://localhost".to_string(),
                key_prefix: None,
            },
        );
        let app = App::new(config).unwrap();
        let mut form = form("Lisbon", "2030-02-01", "2030-02-04");
        form.model = Some("bard".to_string());

        let err = app.try_plan_on(&form, today()).await.unwrap_err();

        assert!(matches!(err, PlanError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_plan_trip_renders_errors() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("  ")]));
        let app = App::new(Config::default()).unwrap().with_client(llm);

        let valid = form("Lisbon", "2099-02-01", "2099-02-04");
        let md = app.plan_trip(&valid).await;
        assert!(md.starts_with("**Error:** An error occurred while planning your trip: "));
        assert!(md.contains("No response from the model"));

        let invalid = form("Lisbon", "2099-02-04", "2099-02-01");
        let md = app.plan_trip(&invalid).await;
        assert!(md.starts_with("**Validation Errors:**"));
    }
}
