//! get_weather tool - forecast for the destination on the departure date

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{WeatherConfig, read_api_key};
use crate::domain::DATE_FORMAT;
use crate::tools::traits::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolOutput};

/// Message returned when the trip date is outside the forecast window
pub const NO_FORECAST_MESSAGE: &str = "No forecast available for the specified trip date.";

/// Weather for one city and date, or a marker that none is available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherReport {
    Forecast {
        city: String,
        temperature: f64,
        status: String,
        humidity: u32,
        wind_speed: f64,
        travel_from: String,
    },
    Unavailable {
        city: String,
        message: String,
        travel_from: String,
    },
}

impl WeatherReport {
    /// Short prose description, used in image prompts
    pub fn describe(&self) -> String {
        match self {
            WeatherReport::Forecast {
                temperature,
                status,
                humidity,
                wind_speed,
                ..
            } => format!(
                "{} skies, about {}°C, humidity {}%, wind speed {} m/s",
                status.to_lowercase(),
                temperature,
                humidity,
                wind_speed
            ),
            WeatherReport::Unavailable { .. } => "typical seasonal weather".to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WeatherReport::Forecast { .. })
    }

    pub fn city(&self) -> &str {
        match self {
            WeatherReport::Forecast { city, .. } | WeatherReport::Unavailable { city, .. } => city,
        }
    }

    pub fn travel_from(&self) -> &str {
        match self {
            WeatherReport::Forecast { travel_from, .. } | WeatherReport::Unavailable { travel_from, .. } => travel_from,
        }
    }
}

/// One 3-hour forecast slot
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub at: DateTime<Utc>,
    pub temperature: f64,
    pub status: String,
    pub humidity: u32,
    pub wind_speed: f64,
}

/// Pick the first slot falling on `date`
pub fn select_forecast(city: &str, date: NaiveDate, entries: &[ForecastEntry]) -> WeatherReport {
    debug!(%city, %date, entry_count = entries.len(), "select_forecast: called");
    let travel_from = date.format(DATE_FORMAT).to_string();
    match entries.iter().find(|e| e.at.date_naive() == date) {
        Some(entry) => WeatherReport::Forecast {
            city: city.to_string(),
            temperature: entry.temperature,
            status: entry.status.clone(),
            humidity: entry.humidity,
            wind_speed: entry.wind_speed,
            travel_from,
        },
        None => {
            info!(%city, %date, "No weather forecast available");
            WeatherReport::Unavailable {
                city: city.to_string(),
                message: NO_FORECAST_MESSAGE.to_string(),
                travel_from,
            }
        }
    }
}

/// OpenWeatherMap 5-day / 3-hour forecast client
#[derive(Clone)]
pub struct WeatherClient {
    api_key_env: String,
    base_url: String,
    http: Client,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        debug!(base_url = %config.base_url, "WeatherClient::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Forecast for `city` on `date`
    pub async fn forecast(&self, city: &str, date: NaiveDate) -> Result<WeatherReport, ToolError> {
        debug!(%city, %date, "WeatherClient::forecast: called");
        let api_key = read_api_key(&self.api_key_env, None, |k| std::env::var(k).ok())?;

        let url = format!("{}/data/2.5/forecast", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "WeatherClient::forecast: upstream error");
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                service: "OpenWeatherMap",
                status: status.as_u16(),
                message,
            });
        }

        let forecast: OwmForecast = response.json().await?;
        let entries = forecast.into_entries();
        Ok(select_forecast(city, date, &entries))
    }
}

/// Get the weather forecast for the destination on the departure date
pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> &'static str {
        "Get the weather forecast for a specified city on the trip departure date. \
         Call this tool to get weather information for a specific city."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination_city": {
                    "type": "string",
                    "description": "The city that the user wants to travel to"
                },
                "travel_from": {
                    "type": "string",
                    "description": "Departure date of the trip in 'YYYY-MM-DD' format"
                }
            },
            "required": ["destination_city", "travel_from"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        debug!(trip_id = %ctx.trip_id, ?input, "WeatherTool::execute: called");
        let city = required_str(&input, "destination_city")?;
        let travel_from = required_str(&input, "travel_from")?;
        let date = NaiveDate::parse_from_str(travel_from, DATE_FORMAT).map_err(|_| {
            ToolError::InvalidArgument(format!("travel_from must be in YYYY-MM-DD format, got '{}'", travel_from))
        })?;

        let report = self.client.forecast(city, date).await?;
        Ok(serde_json::to_string(&report)?.into())
    }
}

// OpenWeatherMap response types

#[derive(Debug, Deserialize)]
struct OwmForecast {
    #[serde(default)]
    list: Vec<OwmEntry>,
}

impl OwmForecast {
    fn into_entries(self) -> Vec<ForecastEntry> {
        self.list
            .into_iter()
            .filter_map(|e| {
                let at = DateTime::from_timestamp(e.dt, 0)?;
                Some(ForecastEntry {
                    at,
                    temperature: e.main.temp,
                    status: e.weather.into_iter().next().map(|w| w.main).unwrap_or_default(),
                    humidity: e.main.humidity,
                    wind_speed: e.wind.map(|w| w.speed).unwrap_or(0.0),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OwmEntry {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: Option<OwmWind>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}
