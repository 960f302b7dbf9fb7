//! Trip request types and validation
//!
//! `TripForm` carries the raw strings typed by the user. `TripDetails` can
//! only be obtained through `TripForm::validate`, so every `TripDetails` in
//! the system satisfies the date and enum invariants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Date format accepted for travel dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of trip the traveler is after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelExperience {
    Adventurous,
    Relaxing,
    Cultural,
    Luxury,
}

impl TravelExperience {
    pub const ALL: [TravelExperience; 4] = [Self::Adventurous, Self::Relaxing, Self::Cultural, Self::Luxury];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adventurous => "adventurous",
            Self::Relaxing => "relaxing",
            Self::Cultural => "cultural",
            Self::Luxury => "luxury",
        }
    }
}

impl std::fmt::Display for TravelExperience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TravelExperience {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adventurous" => Ok(Self::Adventurous),
            "relaxing" => Ok(Self::Relaxing),
            "cultural" => Ok(Self::Cultural),
            "luxury" => Ok(Self::Luxury),
            _ => Err(()),
        }
    }
}

/// How much the traveler wants to spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendLevel {
    Budget,
    Average,
    Luxury,
}

impl SpendLevel {
    pub const ALL: [SpendLevel; 3] = [Self::Budget, Self::Average, Self::Luxury];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Average => "average",
            Self::Luxury => "luxury",
        }
    }
}

impl std::fmt::Display for SpendLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SpendLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(Self::Budget),
            "average" => Ok(Self::Average),
            "luxury" => Ok(Self::Luxury),
            _ => Err(()),
        }
    }
}

/// Raw trip input as entered by the user
#[derive(Debug, Clone, Default)]
pub struct TripForm {
    pub destination: String,
    pub travel_from: String,
    pub travel_to: String,
    pub travel_experience: String,
    pub spend_level: String,
    /// Model selector (key into `llm.models`); None uses the configured default
    pub model: Option<String>,
}

impl TripForm {
    /// Validate the form against `today`, collecting every problem found
    pub fn validate(&self, today: NaiveDate) -> Result<TripDetails, ValidationErrors> {
        debug!(destination = %self.destination, %today, "TripForm::validate: called");
        let mut errors = Vec::new();

        let destination = self.destination.trim();
        if destination.is_empty() {
            debug!("TripForm::validate: empty destination");
            errors.push("Destination city is required".to_string());
        }

        let travel_from = parse_date(&self.travel_from, "Travel start date", &mut errors);
        let travel_to = parse_date(&self.travel_to, "Travel end date", &mut errors);

        if let (Some(from), Some(to)) = (travel_from, travel_to) {
            if to <= from {
                debug!(%from, %to, "TripForm::validate: end date not after start date");
                errors.push("Travel end date must be after start date".to_string());
            }
            if from < today {
                debug!(%from, %today, "TripForm::validate: start date in the past");
                errors.push("Travel start date cannot be in the past".to_string());
            }
        }

        let travel_experience = self.travel_experience.parse::<TravelExperience>().ok();
        if travel_experience.is_none() {
            debug!(value = %self.travel_experience, "TripForm::validate: unknown travel experience");
            errors.push(format!(
                "Travel experience must be one of: {}",
                join_names(TravelExperience::ALL.iter().map(|e| e.as_str()))
            ));
        }

        let spend_level = self.spend_level.parse::<SpendLevel>().ok();
        if spend_level.is_none() {
            debug!(value = %self.spend_level, "TripForm::validate: unknown spend level");
            errors.push(format!(
                "Spend level must be one of: {}",
                join_names(SpendLevel::ALL.iter().map(|s| s.as_str()))
            ));
        }

        match (travel_from, travel_to, travel_experience, spend_level) {
            (Some(travel_from), Some(travel_to), Some(travel_experience), Some(spend_level)) if errors.is_empty() => {
                debug!("TripForm::validate: valid");
                Ok(TripDetails {
                    destination: destination.to_string(),
                    travel_from,
                    travel_to,
                    travel_experience,
                    spend_level,
                    model: self
                        .model
                        .as_deref()
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string),
                })
            }
            _ => {
                debug!(error_count = errors.len(), "TripForm::validate: invalid");
                Err(ValidationErrors(errors))
            }
        }
    }
}

fn parse_date(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(format!("{} is required", label));
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(format!("{} must be in YYYY-MM-DD format", label));
            None
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Validated trip parameters, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripDetails {
    destination: String,
    travel_from: NaiveDate,
    travel_to: NaiveDate,
    travel_experience: TravelExperience,
    spend_level: SpendLevel,
    model: Option<String>,
}

impl TripDetails {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn travel_from(&self) -> NaiveDate {
        self.travel_from
    }

    pub fn travel_to(&self) -> NaiveDate {
        self.travel_to
    }

    pub fn travel_experience(&self) -> TravelExperience {
        self.travel_experience
    }

    pub fn spend_level(&self) -> SpendLevel {
        self.spend_level
    }

    /// Model selector requested for this trip, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Number of nights between the travel dates
    pub fn nights(&self) -> i64 {
        (self.travel_to - self.travel_from).num_days()
    }
}

/// Every problem found while validating a `TripForm`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trip request: {}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Render as a Markdown bullet list
    pub fn to_markdown(&self) -> String {
        let bullets = self.0.iter().map(|e| format!("- {}", e)).collect::<Vec<_>>().join("\n");
        format!("**Validation Errors:**\n{}", bullets)
    }
}
