//! Integration tests for the `crudview` CLI binary.
//!
//! Argument parsing, help output and error handling run without a server;
//! the record commands run against a wiremock endpoint.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `crudview` binary with env isolation.
///
/// Clears all `CRUDVIEW_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn crudview_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("crudview");
    cmd.env("HOME", "/tmp/crudview-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/crudview-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("CRUDVIEW_PROFILE")
        .env_remove("CRUDVIEW_BASE_URI")
        .env_remove("CRUDVIEW_TOKEN")
        .env_remove("CRUDVIEW_OUTPUT")
        .env_remove("CRUDVIEW_INSECURE")
        .env_remove("CRUDVIEW_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let base_uri = format!("{}/api/customers", server.uri());
    let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
    tokio::task::spawn_blocking(move || {
        crudview_cmd()
            .arg("--base-uri")
            .arg(base_uri)
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = crudview_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    crudview_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("CRUD entity endpoint")
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("create"))
            .and(predicate::str::contains("select")),
    );
}

#[test]
fn test_version_flag() {
    crudview_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("crudview"));
}

#[test]
fn test_completions_bash() {
    crudview_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_subcommand() {
    crudview_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_list_without_endpoint_reports_no_config() {
    let output = crudview_cmd().arg("list").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No endpoint configured"), "got:\n{text}");
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = crudview_cmd()
        .args(["--profile", "nope", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_invalid_base_uri_is_rejected() {
    let output = crudview_cmd()
        .args(["--base-uri", "not a url", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid URL"));
}

#[test]
fn test_create_requires_data() {
    let output = crudview_cmd()
        .args(["--base-uri", "http://127.0.0.1:9/api/x", "create"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--data"));
}

// ── Record commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_renders_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/list"))
        .and(body_partial_json(json!({"page": 2, "size": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contents": [{"id": 6, "name": "F"}, {"id": 7, "name": "G"}],
            "total": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["-o", "json", "list", "--page", "2", "--size", "5"],
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records, json!([{"id": 6, "name": "F"}, {"id": 7, "name": "G"}]));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("12"), "status line missing:\n{stderr}");
    assert!(stderr.contains("[2]"), "page indicator missing:\n{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_renders_plain_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/read/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"contents": {"id": 42, "name": "Answer"}})),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &["-o", "plain", "read", "42"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "42");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_with_field_errors_exits_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"field": "name", "defaultMessage": "Name is required"}]
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["create", "--data", r#"{"name": ""}"#]).await;
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("Name is required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_maps_to_connection_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let output = run_against(&server, &["list"]).await;
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("500"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes_skips_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/delete"))
        .and(body_partial_json(json!({"id": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contents": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["-y", "delete", "--data", r#"{"id": 3}"#]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_context_path_is_printed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/contextpath"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/shop"))
        .mount(&server)
        .await;

    let output = run_against(&server, &["context-path"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "/shop");
}
