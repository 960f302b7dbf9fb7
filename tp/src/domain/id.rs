//! Trip request ID generation
//!
//! IDs use the format: `{6-char-hex}-trip-{slug}`
//! Example: `019430-trip-new-york`

use tracing::debug;

/// Generate a trip request ID from the destination
pub fn generate_trip_id(destination: &str) -> String {
    debug!(%destination, "generate_trip_id: called");
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.simple().to_string()[..6];
    let slug = slugify(destination);
    if slug.is_empty() {
        format!("{}-trip", hex_prefix)
    } else {
        format!("{}-trip-{}", hex_prefix, slug)
    }
}

/// Slugify a destination name for use in IDs
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
