//! TripPlanner - LLM travel planner
//!
//! CLI entry point: plan a trip, list tools, list models.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use tripplanner::app::App;
use tripplanner::cli::{Cli, Command, OutputFormat, config_arg, generate_after_help};
use tripplanner::config::Config;
use tripplanner::domain::TripForm;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("tripplanner.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Help is rendered before parsing; read the config it will describe up front
    let help_config = Config::load(config_arg(std::env::args()).as_ref()).unwrap_or_default();
    let after_help = generate_after_help(&help_config);
    let cmd = Cli::command().after_help(after_help.clone());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("TripPlanner loaded config: default={}", config.llm.default);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Plan {
            destination,
            from,
            to,
            experience,
            spend,
            model,
            output,
        }) => {
            debug!(%destination, %from, %to, "main: matched Plan command");
            let form = TripForm {
                destination,
                travel_from: from,
                travel_to: to,
                travel_experience: experience,
                spend_level: spend,
                model,
            };
            cmd_plan(config, &form, output.as_deref()).await
        }
        Some(Command::Tools { format }) => {
            debug!(?format, "main: matched Tools command");
            cmd_tools(config, format)
        }
        Some(Command::Models { format }) => {
            debug!(?format, "main: matched Models command");
            cmd_models(&config, format)
        }
        None => {
            debug!("main: no command, printing help");
            Cli::command().after_help(after_help).print_help()?;
            Ok(())
        }
    }
}

async fn cmd_plan(config: Config, form: &TripForm, output: Option<&Path>) -> Result<()> {
    debug!(?output, "cmd_plan: called");
    let app = App::new(config)?;

    let (markdown, ok) = match app.try_plan(form).await {
        Ok(outcome) => {
            info!(
                rounds = outcome.rounds,
                tool_calls = outcome.tool_calls.len(),
                total_tokens = outcome.usage.total(),
                "cmd_plan: plan ready"
            );
            (outcome.markdown, true)
        }
        Err(e) => {
            info!(error = %e, "cmd_plan: planning failed");
            (e.to_markdown(), false)
        }
    };

    match output {
        Some(path) => {
            fs::write(path, &markdown).context(format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{}", markdown),
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_tools(config: Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_tools: called");
    let app = App::new(config)?;
    let defs = app.dispatcher().definitions();

    match format {
        OutputFormat::Json => {
            let schemas: Vec<_> = defs.iter().map(|d| d.to_openai_schema()).collect();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
        OutputFormat::Text => {
            println!("{}", "Tools:".bold());
            for def in &defs {
                println!("  {:18} {}", def.name.yellow(), def.description);
            }
        }
    }
    Ok(())
}

fn cmd_models(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_models: called");
    let llm = &config.llm;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(llm)?);
        }
        OutputFormat::Text => {
            println!("{}", "Models:".bold());
            for (name, model) in &llm.models {
                let marker = if *name == llm.default { "*".green() } else { " ".normal() };
                println!(
                    "{} {:14} {} {}",
                    marker,
                    name.yellow(),
                    model.provider,
                    model.base_url.dimmed()
                );
            }
        }
    }
    Ok(())
}
