//! generate_image tool - destination picture reflecting the forecast

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{WeatherClient, WeatherReport};
use crate::config::{ImageConfig, read_api_key};
use crate::domain::DATE_FORMAT;
use crate::tools::traits::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolOutput};

/// Build the image generation prompt from a weather report
pub fn image_prompt(report: &WeatherReport) -> String {
    format!(
        "Generate a realistic image of {} on {} showing {}. \
         Make sure the scenery reflects the weather and time of year, \
         with iconic landmarks and natural seasonal colors.",
        report.city(),
        report.travel_from(),
        report.describe()
    )
}

/// First date of a `YYYY-MM-DD` or `YYYY-MM-DD - YYYY-MM-DD` range
fn first_trip_date(trip_dates: &str) -> Result<NaiveDate, ToolError> {
    let first = trip_dates.get(..10).unwrap_or(trip_dates).trim();
    NaiveDate::parse_from_str(first, DATE_FORMAT).map_err(|_| {
        ToolError::InvalidArgument(format!(
            "trip_dates must start with a YYYY-MM-DD date, got '{}'",
            trip_dates
        ))
    })
}

/// Generate an image of the destination on the trip dates
pub struct ImageTool {
    api_key_env: String,
    base_url: String,
    model: String,
    size: String,
    http: Client,
    weather: WeatherClient,
}

impl ImageTool {
    pub fn new(config: &ImageConfig, weather: WeatherClient) -> Self {
        debug!(model = %config.model, size = %config.size, "ImageTool::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            http,
            weather,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, ToolError> {
        debug!(prompt_len = prompt.len(), "ImageTool::generate: called");
        let api_key = read_api_key(&self.api_key_env, None, |k| std::env::var(k).ok())?;

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "response_format": "b64_json",
        });

        let url = format!("{}/v1/images/generations", self.base_url);
        let response = self.http.post(&url).bearer_auth(&api_key).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "ImageTool::generate: upstream error");
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                service: "OpenAI Images",
                status: status.as_u16(),
                message,
            });
        }

        let images: ImagesResponse = response.json().await?;
        extract_image(images)
    }
}

/// Pull the first base64 image out of the response and check it decodes
fn extract_image(images: ImagesResponse) -> Result<String, ToolError> {
    let data = images
        .data
        .into_iter()
        .find_map(|d| d.b64_json)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ToolError::NoData("No image data returned from OpenAI API.".to_string()))?;

    let bytes = BASE64
        .decode(data.as_bytes())
        .map_err(|e| ToolError::InvalidResponse(format!("image payload is not base64: {}", e)))?;
    debug!(image_bytes = bytes.len(), "extract_image: decoded");

    Ok(data)
}

/// Short note for the model, with the image itself as a Markdown attachment
fn image_output(city: &str, data: &str) -> ToolOutput {
    ToolOutput::with_attachment(
        format!(
            "Image of {} generated. It is attached to the final itinerary automatically; do not reproduce it.",
            city
        ),
        format!("![{}](data:image/png;base64,{})", city, data),
    )
}

#[async_trait]
impl Tool for ImageTool {
    fn name(&self) -> &'static str {
        "generate_image"
    }

    fn description(&self) -> &'static str {
        "Generate a realistic image of the destination city on the specified trip dates, \
         reflecting the typical weather conditions."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination_city": {
                    "type": "string",
                    "description": "The city that the user wants to travel to"
                },
                "trip_dates": {
                    "type": "string",
                    "description": "The dates of the trip in 'YYYY-MM-DD' or 'YYYY-MM-DD - YYYY-MM-DD' format"
                }
            },
            "required": ["destination_city", "trip_dates"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        debug!(trip_id = %ctx.trip_id, ?input, "ImageTool::execute: called");
        let city = required_str(&input, "destination_city")?;
        let date = first_trip_date(required_str(&input, "trip_dates")?)?;

        let report = self.weather.forecast(city, date).await?;
        let prompt = image_prompt(&report);
        let data = self.generate(&prompt).await?;

        info!(trip_id = %ctx.trip_id, %city, "image generated");
        Ok(image_output(city, &data))
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}
