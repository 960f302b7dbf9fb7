//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// TripPlanner - LLM travel planner with weather, image and currency tools
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Plan trips with an LLM that can check the weather, draw the destination and convert currency",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip and print the Markdown itinerary
    Plan {
        /// City to travel to
        #[arg(short, long)]
        destination: String,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(short, long = "from", value_name = "DATE")]
        from: String,

        /// Last day of the trip (YYYY-MM-DD)
        #[arg(short, long = "to", value_name = "DATE")]
        to: String,

        /// adventurous, relaxing, cultural or luxury
        #[arg(short, long)]
        experience: String,

        /// budget, average or luxury
        #[arg(short, long)]
        spend: String,

        /// Model selector from the config (defaults to llm.default)
        #[arg(short, long)]
        model: Option<String>,

        /// Write the Markdown to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the tools offered to the model
    Tools {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List configured model selectors
    Models {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for listing commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use 'text' or 'json'", s))
            }
        }
    }
}

/// Whether an API key variable is set
pub struct KeyCheck {
    pub env: String,
    pub purpose: &'static str,
    pub present: bool,
}

impl KeyCheck {
    pub fn check(env: &str, purpose: &'static str) -> Self {
        debug!(%env, purpose, "KeyCheck::check: called");
        let present = std::env::var(env).map(|v| !v.trim().is_empty()).unwrap_or(false);
        Self {
            env: env.to_string(),
            purpose,
            present,
        }
    }
}

/// Check the API key variables named by `config`
pub fn check_api_keys(config: &Config) -> Vec<KeyCheck> {
    debug!("check_api_keys: called");
    let llm = &config.llm;
    let tools = &config.tools;

    let mut checks = Vec::new();
    if let Some(env) = llm.models.get(&llm.default).and_then(|m| m.api_key_env.as_deref()) {
        checks.push(KeyCheck::check(env, "model + images"));
    }
    checks.push(KeyCheck::check(&tools.weather.api_key_env, "weather"));
    checks.push(KeyCheck::check(&tools.currency.api_key_env, "currency"));
    checks
}

/// Find the `-c`/`--config` value before clap runs
///
/// The help text is built before parsing, so this is how it learns which
/// config file names the key variables.
pub fn config_arg<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = arg.as_ref();
        if arg == "--" {
            break;
        }
        if arg == "-c" || arg == "--config" {
            return args.next().map(|v| PathBuf::from(v.as_ref()));
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key checks and the log path
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("API Keys:\n");
    for key in check_api_keys(config) {
        let icon = if key.present { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {:<22} {}\n", icon, key.env, key.purpose));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from([
            "tp",
            "-l",
            "debug",
            "plan",
            "--destination",
            "Paris",
            "--from",
            "2030-05-01",
            "--to",
            "2030-05-05",
            "--experience",
            "cultural",
            "--spend",
            "budget",
            "-m",
            "llama2",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Plan {
                destination,
                from,
                to,
                model,
                output,
                ..
            }) => {
                assert_eq!(destination, "Paris");
                assert_eq!(from, "2030-05-01");
                assert_eq!(to, "2030-05-05");
                assert_eq!(model.as_deref(), Some("llama2"));
                assert!(output.is_none());
            }
            other => panic!("expected plan command, got {:?}", other),
        }
    }

    #[test]
    fn test_output_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_after_help_mentions_keys_and_logs() {
        let help = generate_after_help(&Config::default());
        assert!(help.contains("OPEN_WEATHER_API_KEY"));
        assert!(help.contains("ABSTRACT_API_KEY"));
        assert!(help.contains("tripplanner.log"));
    }

    #[test]
    fn test_after_help_follows_renamed_keys() {
        let mut config = Config::default();
        config.tools.weather.api_key_env = "TEAM_OWM_KEY".to_string();
        config.tools.currency.api_key_env = "TEAM_FX_KEY".to_string();

        let help = generate_after_help(&config);

        assert!(help.contains("TEAM_OWM_KEY"));
        assert!(help.contains("TEAM_FX_KEY"));
        assert!(!help.contains("OPEN_WEATHER_API_KEY"));
        assert!(!help.contains("ABSTRACT_API_KEY"));
    }

    #[test]
    fn test_config_arg() {
        assert_eq!(config_arg(["tp", "-c", "a.yml", "tools"]), Some(PathBuf::from("a.yml")));
        assert_eq!(config_arg(["tp", "tools", "--config", "b.yml"]), Some(PathBuf::from("b.yml")));
        assert_eq!(config_arg(["tp", "--config=c.yml", "--help"]), Some(PathBuf::from("c.yml")));
        assert_eq!(config_arg(["tp", "--help"]), None);
        assert_eq!(config_arg(["tp", "-c"]), None);
    }
}
