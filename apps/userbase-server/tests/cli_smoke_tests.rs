//! CLI smoke tests for the userbase-server binary.
//!
//! Every test points `server.home_dir` at a temp dir so nothing is written
//! to the real home directory.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn run_userbase_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_userbase-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute userbase-server")
}

fn yaml_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

/// Write a config whose home dir lives inside `dir`.
fn write_config(dir: &TempDir, name: &str, extra: &str) -> String {
    let config_path = dir.path().join(name);
    let content = format!(
        r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 8090
{extra}
"#,
        yaml_path(&dir.path().join("home"))
    );
    std::fs::write(&config_path, content).expect("Failed to write config file");
    config_path.to_string_lossy().to_string()
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn http_get(port: u16, path: &str) -> Option<String> {
    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.ok()?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.ok()?;
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.ok()?;
    Some(raw)
}

#[test]
fn test_cli_help_command() {
    let output = run_userbase_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_userbase_server(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("userbase-server"), "Should contain binary name");
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_userbase_server(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_userbase_server(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed").unwrap();

    let output = run_userbase_server(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "valid.yaml",
        r#"
database:
  url: "sqlite://database/users.db"

logging:
  default:
    console_level: info
    file: "logs/userbase.log"
    file_level: info
    max_age_days: 28
    max_backups: 3
    max_size_mb: 100

modules:
  users:
    bootstrap_schema: true
"#,
    );

    let output = run_userbase_server(&["--config", &config_path, "check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "Should succeed with valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Configuration check passed"));
    // Relative SQLite paths resolve under the home dir.
    assert!(stdout.contains("home/database/users.db"), "{stdout}");
}

#[test]
fn test_cli_unknown_module_option_fails_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "bad_module.yaml",
        r#"
modules:
  users:
    bootstrap_schema: true
    bogus: 1
"#,
    );

    let output = run_userbase_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("users"), "{stderr}");
}

#[test]
fn test_cli_non_sqlite_database_fails_check_unless_mocked() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "pg.yaml",
        r#"
database:
  url: "postgresql://localhost/nonexistent"
"#,
    );

    let output = run_userbase_server(&["--config", &config_path, "check"]);
    assert!(!output.status.success(), "postgres DSN is not supported");

    let output = run_userbase_server(&["--config", &config_path, "--mock", "check"]);
    assert!(
        output.status.success(),
        "Should succeed with mock database: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("sqlite::memory:"));
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "print.yaml", "");

    let output = run_userbase_server(&["--config", &config_path, "--port", "9123", "--print-config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "{stdout}");
    assert!(stdout.contains("server:"));
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_userbase_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Start the server"));

    let output = run_userbase_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Check configuration"));
}

#[tokio::test]
async fn test_cli_run_with_mock_database_serves_users() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "run.yaml", "");
    let port = free_port();

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_userbase-server"))
        .args(["--config", &config_path, "--mock", "--port", &port.to_string(), "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn userbase-server");

    let mut health = None;
    for _ in 0..50 {
        if let Some(raw) = http_get(port, "/health").await {
            health = Some(raw);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let health = health.expect("server should accept connections");
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.contains("healthy"));

    let users = http_get(port, "/users").await.expect("GET /users");
    assert!(users.starts_with("HTTP/1.1 200"), "{users}");
    assert!(users.contains(r#"{"success":true,"data":[]}"#), "{users}");

    child.kill().await.unwrap();
}
