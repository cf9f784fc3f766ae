//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation
//! - Replaying a batch against a mock Elasticsearch
//! - Error handling for bad inputs

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the jmx-elastic binary
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("jmx-elastic").expect("Failed to find jmx-elastic binary");
    cmd.env_remove("JMX_ELASTIC_URL")
        .env_remove("JMX_ELASTIC_ROOT_PREFIX")
        .env_remove("JMX_ELASTIC_CONFIG");
    cmd
}

/// Helper to create a temporary file with given content
fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file.flush().expect("Failed to flush");
    file
}

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--replay"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test that a valid configuration is accepted via --validate flag
#[test]
fn test_validate_valid_config() {
    let config = r#"
connectionUrl: "http://localhost:9200"
rootPrefix: "prod"
booleanAsNumber: true
"#;

    let file = create_temp_file(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("prod_jmx-entries"));
}

/// Test that a missing config file falls back to defaults
#[test]
fn test_validate_missing_config_uses_defaults() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/elastic.yaml")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("jmxtrans_jmx-entries"));
}

/// Test that --root-prefix overrides the config file
#[test]
fn test_root_prefix_override() {
    let file = create_temp_file("rootPrefix: \"fromfile\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--root-prefix")
        .arg("fromcli")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("fromcli_jmx-entries"));
}

/// Test that invalid YAML is rejected
#[test]
fn test_validate_invalid_yaml() {
    let file = create_temp_file("connectionUrl: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

/// Test that an invalid connection URL is rejected
#[test]
fn test_validate_invalid_url() {
    let file = create_temp_file("connectionUrl: \"ftp://es:9200\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

/// Test that a missing replay file is reported
#[test]
fn test_replay_missing_file() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/elastic.yaml")
        .arg("--replay")
        .arg("/nonexistent/batch.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read replay file"));
}

/// Test that an unreachable backend fails startup
#[test]
fn test_unreachable_backend_fails() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/elastic.yaml")
        .arg("--connection-url")
        .arg("http://127.0.0.1:1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create elastic mapping"));
}

/// Test replaying a batch end to end against a mock Elasticsearch
#[tokio::test(flavor = "multi_thread")]
async fn test_replay_batch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/replay_jmx-entries"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/replay_jmx-entries/jmx-entry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&mock_server)
        .await;

    let batch = json!({
        "server": {"host": "w2", "port": 1099},
        "query": {"obj": "java.lang:type=GarbageCollector,name=ConcurrentMarkSweep"},
        "results": [
            {"attributeName": "CollectionTime", "values": {"value": 42}, "epoch": 1000},
            {"attributeName": "CollectionCount", "values": {"value": 7, "state": "N/A"}, "epoch": 1000}
        ]
    });
    let file = create_temp_file(&batch.to_string());
    let replay_path = file.path().to_path_buf();
    let url = mock_server.uri();

    let output = tokio::task::spawn_blocking(move || {
        cmd()
            .arg("-c")
            .arg("/nonexistent/path/elastic.yaml")
            .arg("--connection-url")
            .arg(url)
            .arg("--root-prefix")
            .arg("replay")
            .arg("--replay")
            .arg(replay_path)
            .output()
            .expect("Failed to run jmx-elastic")
    })
    .await
    .expect("command task panicked");

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("written: 2, failed: 0, skipped: 1"));
}
