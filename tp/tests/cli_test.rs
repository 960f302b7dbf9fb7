//! CLI tests for the tp binary

use std::path::Path;

use assert_cmd::Command;
use chrono::{Duration, Local};
use predicates::prelude::*;
use tempfile::TempDir;

/// tp with config, data and working directories isolated under `home`
fn tp(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tp").expect("tp binary");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_plan_invalid_dates_prints_validation_errors() {
    let home = TempDir::new().unwrap();

    tp(home.path())
        .args([
            "plan",
            "--destination",
            "Paris",
            "--from",
            "2024-01-10",
            "--to",
            "2024-01-05",
            "--experience",
            "cultural",
            "--spend",
            "budget",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("**Validation Errors:**"))
        .stdout(predicate::str::contains("- Travel end date must be after start date"));
}

#[test]
fn test_plan_missing_api_key_prints_error_markdown() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("tp.yml");
    std::fs::write(
        &config,
        r#"
llm:
  default: cloud
  models:
    cloud:
      provider: openai
      model: gpt-4o-mini
      api-key-env: TRIPPLANNER_CLI_TEST_MISSING_KEY
      base-url: http://127.0.0.1:9
"#,
    )
    .unwrap();

    let from = Local::now().date_naive() + Duration::days(10);
    let to = from + Duration::days(3);
    let from = from.format("%Y-%m-%d").to_string();
    let to = to.format("%Y-%m-%d").to_string();

    tp(home.path())
        .env_remove("TRIPPLANNER_CLI_TEST_MISSING_KEY")
        .arg("--config")
        .arg(&config)
        .args(["plan", "-d", "Rome", "-e", "relaxing", "-s", "average"])
        .args(["--from", from.as_str(), "--to", to.as_str()])
        .assert()
        .failure()
        .stdout(predicate::str::starts_with(
            "**Error:** An error occurred while planning your trip:",
        ))
        .stdout(predicate::str::contains("TRIPPLANNER_CLI_TEST_MISSING_KEY"));
}

#[test]
fn test_tools_lists_catalog() {
    let home = TempDir::new().unwrap();

    tp(home.path())
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("get_weather"))
        .stdout(predicate::str::contains("generate_image"))
        .stdout(predicate::str::contains("convert_currency"));
}

#[test]
fn test_tools_json_is_openai_schema() {
    let home = TempDir::new().unwrap();

    let output = tp(home.path()).args(["tools", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let schemas: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = schemas
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["function"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["convert_currency", "generate_image", "get_weather"]);
}

#[test]
fn test_models_marks_default() {
    let home = TempDir::new().unwrap();

    tp(home.path())
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o-mini"))
        .stdout(predicate::str::contains("llama2"))
        .stdout(predicate::str::contains("*"));
}

#[test]
fn test_help_lists_keys_from_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("tp.yml");
    std::fs::write(
        &config,
        r#"
tools:
  weather:
    api-key-env: TRIPPLANNER_CLI_TEST_OWM
  currency:
    api-key-env: TRIPPLANNER_CLI_TEST_FX
"#,
    )
    .unwrap();

    tp(home.path())
        .arg("--config")
        .arg(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRIPPLANNER_CLI_TEST_OWM"))
        .stdout(predicate::str::contains("TRIPPLANNER_CLI_TEST_FX"))
        .stdout(predicate::str::contains("OPEN_WEATHER_API_KEY").not());
}
