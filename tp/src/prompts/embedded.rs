//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System prompt: planner role, tool catalog, output guidance
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// User prompt: trip parameters and the sections to include
pub const USER: &str = include_str!("../../prompts/user.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "user" => Some(USER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_system() {
        let system = get_embedded("system").unwrap();
        assert!(system.contains("travel planner"));
        assert!(system.contains("TOOLS AVAILABLE"));
        assert!(system.contains("Markdown"));
    }

    #[test]
    fn test_get_embedded_user() {
        let user = get_embedded("user").unwrap();
        assert!(user.contains("{{destination}}"));
        assert!(user.contains("Budget breakdown"));
        assert!(user.contains("Packing list"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("itinerary").is_none());
    }
}
