//! CLI smoke tests for the sensus-server binary.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn run_sensus_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sensus-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute sensus-server")
}

async fn run_sensus_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_sensus-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

/// Config rooted in `dir` so logs, database and screenshots stay inside it.
fn write_config(dir: &Path, name: &str, extra: &str) -> String {
    let home = dir.join("home").to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 8087

database:
  url: "sqlite://database/sensus.db"

logging:
  default:
    console_level: info
    file: "logs/sensus.log"
    file_level: info
    max_age_days: 28
    max_backups: 3
    max_size_mb: 100
{extra}"#
    );
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_sensus_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("sensus-server") || stdout.contains("Sensus"),
        "Should contain binary name"
    );
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_sensus_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sensus-server"));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_sensus_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should contain error message about invalid command: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    for flag in ["--config", "-c"] {
        let output = run_sensus_server(&[flag, "/nonexistent/config.yaml", "check"]);

        assert!(!output.status.success(), "Should fail with missing config");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("config file not found"),
            "Should mention the missing file ({flag}): {stderr}"
        );
    }
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_sensus_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.to_lowercase().contains("yaml"),
        "Should mention YAML parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "valid.yaml", "");

    let output = run_sensus_server(&["--config", &config_path, "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "Should succeed with valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Configuration check passed"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:8087"), "{stdout}");
}

#[test]
fn test_cli_port_override_in_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "port.yaml", "");

    let output = run_sensus_server(&["--config", &config_path, "--port", "9191", "check"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("127.0.0.1:9191"), "{stdout}");
}

#[test]
fn test_cli_invalid_bind_address() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "bad_addr.yaml",
        r#"
modules:
  api_ingress:
    bind_addr: "not-an-address"
"#,
    );

    let output = run_sensus_server(&["--config", &config_path, "run"]);

    assert!(!output.status.success(), "Should fail with invalid bind address");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid bind address"),
        "Should mention address parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_unknown_module_option_fails_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        "unknown.yaml",
        r#"
modules:
  user_records:
    screenshot_quality: 90
"#,
    );

    let output = run_sensus_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("user_records"), "{stderr}");
}

#[test]
fn test_cli_mock_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "mock.yaml", "");
    // a non-sqlite DSN is replaced by the in-memory database under --mock
    let content = std::fs::read_to_string(&config_path)
        .unwrap()
        .replace("sqlite://database/sensus.db", "postgresql://localhost/nonexistent");
    std::fs::write(&config_path, content).unwrap();

    let output = run_sensus_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success(), "postgres DSN is rejected without --mock");

    let output = run_sensus_server(&["--config", &config_path, "--mock", "check"]);
    assert!(
        output.status.success(),
        "Should succeed with mock database: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sqlite::memory:"), "{stdout}");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "print.yaml", "");

    let output = run_sensus_server(&["--config", &config_path, "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("server:"));
    assert!(stdout.contains("sqlite://database/sensus.db"));
}

#[tokio::test]
async fn test_cli_run_command_starts_server() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "run.yaml", "");

    let result = run_sensus_server_with_timeout(
        &["--config", &config_path, "--port", "0", "run"],
        Duration::from_secs(10),
    )
    .await;

    match result {
        // still serving when the timeout fired
        Err(err) if err.to_string().contains("elapsed") => {}
        Err(err) => panic!("Server failed to start: {err}"),
        Ok(output) => panic!(
            "Server exited early:\nSTDOUT: {}\nSTDERR: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ),
    }

    let home = temp_dir.path().join("home");
    assert!(home.join("database").join("sensus.db").is_file());
    assert!(home.join("screenshots").is_dir());
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_sensus_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Start the server"));

    let output = run_sensus_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Check configuration"));
}
