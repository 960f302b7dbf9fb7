//! convert_currency tool - Abstract exchange-rates conversion

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{CurrencyConfig, read_api_key};
use crate::domain::DATE_FORMAT;
use crate::tools::traits::required_str;
use crate::tools::{Tool, ToolContext, ToolError, ToolOutput};

/// Parsed conversion request
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
}

impl ConversionRequest {
    /// Accepts `{data: {...}}` as declared in the schema, or the flat object
    pub fn from_input(input: &Value) -> Result<Self, ToolError> {
        let args = match input.get("data") {
            Some(data) if data.is_object() => data,
            _ => input,
        };

        let from_currency = required_str(args, "from_currency")?.to_uppercase();
        let to_currency = required_str(args, "to_currency")?.to_uppercase();
        let amount = match &args["amount"] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|a| a.is_finite())
        .ok_or_else(|| ToolError::InvalidArgument("amount must be a number".to_string()))?;

        Ok(Self {
            from_currency,
            to_currency,
            amount,
        })
    }
}

/// Tool output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub converted_amount: f64,
}

/// Convert an amount between currencies at today's rate
pub struct CurrencyTool {
    api_key_env: String,
    base_url: String,
    http: Client,
}

impl CurrencyTool {
    pub fn new(config: &CurrencyConfig) -> Self {
        debug!(base_url = %config.base_url, "CurrencyTool::new: called");
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

    async fn convert(&self, request: &ConversionRequest, ctx: &ToolContext) -> Result<Conversion, ToolError> {
        debug!(from = %request.from_currency, to = %request.to_currency, "CurrencyTool::convert: called");
        let api_key = read_api_key(&self.api_key_env, None, |k| std::env::var(k).ok())?;

        let date = ctx.today.format(DATE_FORMAT).to_string();
        let amount = request.amount.to_string();
        let url = format!("{}/v1/convert", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", api_key.as_str()),
                ("base", request.from_currency.as_str()),
                ("target", request.to_currency.as_str()),
                ("date", date.as_str()),
                ("base_amount", amount.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "CurrencyTool::convert: upstream error");
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                service: "Abstract exchange rates",
                status: status.as_u16(),
                message,
            });
        }

        let body: ConvertResponse = response.json().await?;
        build_conversion(request, body)
    }
}

fn build_conversion(request: &ConversionRequest, body: ConvertResponse) -> Result<Conversion, ToolError> {
    let converted_amount = body.converted_amount.ok_or_else(|| {
        ToolError::NoData(format!(
            "Conversion from {} to {} failed. Please check the currency codes and try again.",
            request.from_currency, request.to_currency
        ))
    })?;

    Ok(Conversion {
        from_currency: request.from_currency.clone(),
        to_currency: request.to_currency.clone(),
        amount: request.amount,
        converted_amount,
    })
}

#[async_trait]
impl Tool for CurrencyTool {
    fn name(&self) -> &'static str {
        "convert_currency"
    }

    fn description(&self) -> &'static str {
        "Convert an amount from one currency to another. \
         Call this tool to convert a specified amount from one currency to another."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "object",
                    "properties": {
                        "from_currency": {
                            "type": "string",
                            "description": "The currency code to convert from (e.g., 'USD', 'EUR')."
                        },
                        "to_currency": {
                            "type": "string",
                            "description": "The currency code to convert to (e.g., 'JPY', 'GBP')."
                        },
                        "amount": {
                            "type": "number",
                            "description": "The amount of money to convert."
                        }
                    },
                    "required": ["from_currency", "to_currency", "amount"],
                    "additionalProperties": false
                }
            },
            "required": ["data"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        debug!(trip_id = %ctx.trip_id, ?input, "CurrencyTool::execute: called");
        let request = ConversionRequest::from_input(&input)?;
        let conversion = self.convert(&request, ctx).await?;
        Ok(serde_json::to_string(&conversion)?.into())
    }
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    converted_amount: Option<f64>,
}
