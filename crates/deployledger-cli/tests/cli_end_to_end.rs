#![deny(clippy::all, clippy::pedantic)]

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

fn workflow_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write workflow");
    file
}

#[test]
fn push_reports_deployment_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/deployment-info")
            .header("idempotency-key", "gh-run-77")
            .json_body(serde_json::json!({
                "stage": "staging",
                "service_name": "billing",
                "tag": "2024.05.01",
                "workflow_info": {"repository": "acme/billing", "sha": "abc123"}
            }));
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"id":"6f1c3c5e-8a1e-4a55-9a47-0b4c2f1d2e3f","duplicate":false}"#);
    });

    let file = workflow_file(r#"{"repository": "acme/billing"}"#);
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deployledger-cli"));
    let assert = cmd
        .env("DEPLOYLEDGER_SERVER_URL", server.base_url())
        .env("DEPLOYLEDGER_IDEMPOTENCY_KEY", "gh-run-77")
        .args(["push", "--service", "billing", "--stage", "staging", "--tag", "2024.05.01"])
        .args(["--workflow", "sha=abc123", "--workflow-file"])
        .arg(file.path())
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"duplicate\": false"));
    mock.assert();
}

#[test]
fn list_prints_next_cursor() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/deployments")
            .query_param("environment", "prod");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"items":[],"next_cursor":"eyJ0In0"}"#);
    });

    Command::new(assert_cmd::cargo::cargo_bin!("deployledger-cli"))
        .env("DEPLOYLEDGER_SERVER_URL", server.base_url())
        .args(["list", "--environment", "prod"])
        .assert()
        .success()
        .stdout(contains("eyJ0In0"));
    mock.assert();
}

#[test]
fn missing_server_fails() {
    Command::new(assert_cmd::cargo::cargo_bin!("deployledger-cli"))
        .env_remove("DEPLOYLEDGER_SERVER_URL")
        .args(["show", "6f1c3c5e-8a1e-4a55-9a47-0b4c2f1d2e3f"])
        .assert()
        .failure()
        .stderr(contains("MissingServer"));
}

#[test]
fn not_found_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET")
            .path("/deployments/6f1c3c5e-8a1e-4a55-9a47-0b4c2f1d2e3f");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"error":{"code":"not_found","message":"deployment not found"}}"#);
    });

    Command::new(assert_cmd::cargo::cargo_bin!("deployledger-cli"))
        .env("DEPLOYLEDGER_SERVER_URL", server.base_url())
        .args(["show", "6f1c3c5e-8a1e-4a55-9a47-0b4c2f1d2e3f"])
        .assert()
        .failure()
        .stderr(contains("not_found"));
}
