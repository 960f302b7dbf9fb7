//! Domain types for the trip planner
//!
//! A planning request starts as a raw `TripForm`, becomes an immutable
//! `TripDetails` after validation, and is tagged with a trip id for logging.

mod id;
mod trip;

pub use id::generate_trip_id;
pub use trip::{DATE_FORMAT, SpendLevel, TravelExperience, TripDetails, TripForm, ValidationErrors};
