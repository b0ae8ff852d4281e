//! CLI Integration Tests
//!
//! These tests run the built `tankwatch` binary against a sensor log in a
//! temporary directory, passed through `TANKWATCH_SOURCE`. Every run passes
//! `--utc`, `--no-color` and a config path inside the temporary directory so
//! neither the machine's time zone nor a user config file leaks into the
//! output.
//!
//! ```
//! cargo test --package tankwatch-cli --test cli_integration
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const LOG: &str = "timestamp,tanknumber,pH_Value,temp_Value
2025-01-01 09:57:10,1,7.0,25.0
2025-01-01 09:58:10,1,5.9,25.5
2025-01-01 09:59:10,2,9.5,35.0
2025-01-01 10:00:00,1,7.0,25.0
2025-01-01 10:00:20,1,7.4,26.0
not-a-row
";

const NOW: &str = "2025-01-01T10:00:30Z";

struct Fixture {
    dir: TempDir,
    log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("sensor_Value.csv");
        std::fs::write(&log, LOG).unwrap();
        Self { dir, log }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn run(&self, args: &[&str]) -> Output {
        run_tankwatch(&self.config_path(), &self.log, args)
    }
}

/// Run the tankwatch binary with an isolated environment.
fn run_tankwatch(config: &Path, source: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tankwatch"))
        .env("TANKWATCH_SOURCE", source)
        .env_remove("NO_COLOR")
        .env("RUST_LOG", "warn")
        .arg("--utc")
        .arg("--no-color")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to run tankwatch binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Help and Version
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_tankwatch"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success(), "Help should succeed");
    let text = stdout(&output);
    for command in ["resample", "check", "config", "completions"] {
        assert!(text.contains(command), "Help should list {command}");
    }
}

#[test]
fn test_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tankwatch"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Resample
// =============================================================================

#[test]
fn test_resample_csv_minute() {
    let fx = Fixture::new();
    let output = fx.run(&["resample", "--format", "csv", "--now", NOW]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "label,ph");
    assert_eq!(lines.len(), 61);
    assert_eq!(lines[60], "10:00,7");
    assert_eq!(lines[59], "09:59,");
    assert_eq!(lines[58], "09:58,5.9");
    assert_eq!(lines[57], "09:57,7");
}

#[test]
fn test_resample_average_fill() {
    let fx = Fixture::new();
    let output = fx.run(&[
        "resample",
        "--format",
        "csv",
        "--no-header",
        "--fill",
        "average",
        "--now",
        NOW,
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 60);
    assert_eq!(text.lines().last(), Some("10:00,7.2"));
}

#[test]
fn test_resample_json_other_tank() {
    let fx = Fixture::new();
    let output = fx.run(&[
        "--compact",
        "resample",
        "--metric",
        "temperature",
        "--tank",
        "tank_2",
        "--format",
        "json",
        "--now",
        NOW,
    ]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(value["tank"], "tank_2");
    assert_eq!(value["metric"], "temperature");
    assert_eq!(value["color"], "blue");
    assert_eq!(value["values"][58], 35.0);
    assert_eq!(value["values"][59], serde_json::Value::Null);
}

#[test]
fn test_resample_hour_labels() {
    let fx = Fixture::new();
    let output = fx.run(&[
        "resample",
        "--granularity",
        "hour",
        "--format",
        "csv",
        "--now",
        NOW,
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 25);
    assert_eq!(lines[24], "10:00,7");
    assert_eq!(lines[23], "09:00,7");
}

#[test]
fn test_resample_text_output_to_file() {
    let fx = Fixture::new();
    let out = fx.dir.path().join("series.txt");
    let output = fx.run(&[
        "--output",
        out.to_str().unwrap(),
        "resample",
        "--now",
        NOW,
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("pH for tank_1 by minute"));
    assert!(text.contains("5.90 !"));
}

#[test]
fn test_text_output_logs_load_once() {
    let fx = Fixture::new();
    let output = Command::new(env!("CARGO_BIN_EXE_tankwatch"))
        .env("TANKWATCH_SOURCE", &fx.log)
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG")
        .args(["--utc", "--no-color", "--config"])
        .arg(fx.config_path())
        .args(["resample", "--now", NOW])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Loaded ").count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("INFO"), "stderr: {stderr}");
}

#[test]
fn test_missing_source_fails() {
    let fx = Fixture::new();
    let output = run_tankwatch(
        &fx.config_path(),
        &fx.dir.path().join("missing.csv"),
        &["resample", "--now", NOW],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load sensor log"), "stderr: {stderr}");
}

#[test]
fn test_invalid_granularity_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.run(&["resample", "--granularity", "week"]);
    assert_eq!(output.status.code(), Some(2));
}

// =============================================================================
// Check
// =============================================================================

#[test]
fn test_check_reports_ph_out_of_range() {
    let fx = Fixture::new();
    let output = fx.run(&["check", "--now", NOW]);
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"type":"sensorAlert","chartId":"phAlert","status":"outOfRange"}"#,
            r#"{"type":"sensorAlert","chartId":"tempAlert","status":"inRange"}"#,
            "pH out of range!",
        ]
    );
}

#[test]
fn test_check_with_wider_bars_is_quiet() {
    let fx = Fixture::new();
    let output = fx.run(&["check", "--ph-bars", "8,5", "--now", NOW]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("outOfRange"));
}

#[test]
fn test_check_korean_banner() {
    let fx = Fixture::new();
    let output = fx.run(&["check", "--tank", "2", "--locale", "ko", "--now", NOW]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().last(), Some("pH, 온도 값이 범위를 초과했습니다!"));
}

#[test]
fn test_check_reads_config_file() {
    let fx = Fixture::new();
    std::fs::write(
        fx.config_path(),
        "tank = 2\n\n[temperature]\naxis_min = 10.0\naxis_max = 40.0\nlow_bar = 30.0\nhigh_bar = 40.0\n",
    )
    .unwrap();
    let output = fx.run(&["check", "--now", NOW]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().last(), Some("pH out of range!"));
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_init_and_show() {
    let fx = Fixture::new();
    let output = fx.run(&["config", "path"]);
    assert_eq!(
        stdout(&output).trim(),
        fx.config_path().display().to_string()
    );

    let output = fx.run(&["config", "init"]);
    assert!(output.status.success());
    assert!(fx.config_path().exists());

    let output = fx.run(&["config", "init"]);
    assert!(!output.status.success());

    let output = fx.run(&["config", "show"]);
    let text = stdout(&output);
    assert!(text.contains("source = \"sensor_Value.csv\""));
    assert!(text.contains("drag_tolerance = 1.5"));
}

#[test]
fn test_completions() {
    let output = Command::new(env!("CARGO_BIN_EXE_tankwatch"))
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("tankwatch"));
}
