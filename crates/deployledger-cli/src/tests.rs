#![deny(clippy::all, clippy::pedantic)]

use httpmock::MockServer;
use serde_json::json;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::args::{Cli, Commands, ListArgs, PushArgs};
use crate::client::{CliError, Ctx, build_ctx_from_cli};
use crate::handlers::deployments;

fn ctx(server: &MockServer) -> Ctx {
    Ctx::new(&server.base_url()).expect("ctx")
}

fn tmp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write tmp");
    file
}

fn push_args() -> PushArgs {
    PushArgs {
        service: "checkout".into(),
        stage: "prod".into(),
        tag: "v1.4.2".into(),
        workflow: vec!["run_id=991".into()],
        workflow_file: None,
        idempotency_key: None,
    }
}

#[test]
fn build_ctx_errors_without_server() {
    let cli = Cli {
        server: None,
        command: Commands::List(ListArgs::default()),
    };

    let err = build_ctx_from_cli(&cli).expect_err("missing server should fail");
    assert!(matches!(err, CliError::MissingServer));
}

#[test]
fn build_ctx_rejects_garbage_url() {
    let err = Ctx::new("not a url").expect_err("invalid url");
    assert!(matches!(err, CliError::Url(_)));
}

#[test]
fn workflow_entries_override_file_keys() -> Result<(), CliError> {
    let file = tmp_file(r#"{"run_id": 1, "actor": "ci-bot"}"#);
    let info = crate::io::workflow_info(&["run_id=42".into()], Some(file.path()))?;

    assert_eq!(info.get("run_id"), Some(&json!("42")));
    assert_eq!(info.get("actor"), Some(&json!("ci-bot")));
    Ok(())
}

#[test]
fn workflow_entry_without_separator_is_rejected() {
    let err = crate::io::workflow_info(&["run_id".into()], None).expect_err("bad entry");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[test]
fn workflow_file_must_hold_an_object() {
    let file = tmp_file("[1, 2]");
    let err = crate::io::workflow_info(&[], Some(file.path())).expect_err("array rejected");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[test]
fn missing_workflow_file_reports_path() {
    let err = crate::io::workflow_info(&[], Some(std::path::Path::new("/no/such/file.json")))
        .expect_err("missing file");
    assert!(matches!(err, CliError::InputFile { .. }));
}

#[tokio::test]
async fn push_posts_deployment_info() -> Result<(), CliError> {
    let server = MockServer::start();
    let id = Uuid::new_v4();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/deployment-info")
            .header("idempotency-key", "run-991")
            .json_body(json!({
                "stage": "prod",
                "service_name": "checkout",
                "tag": "v1.4.2",
                "workflow_info": {"run_id": "991"}
            }));
        then.status(201)
            .header("content-type", "application/json")
            .body(format!(r#"{{"id":"{id}","duplicate":false}}"#));
    });

    let mut args = push_args();
    args.idempotency_key = Some("run-991".into());
    deployments::push(&ctx(&server), args).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn push_rejects_blank_service_before_sending() {
    let server = MockServer::start();
    let mut args = push_args();
    args.service = "  ".into();
    let err = deployments::push(&ctx(&server), args)
        .await
        .expect_err("blank service");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[tokio::test]
async fn server_errors_surface_code_and_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/deployment-info");
        then.status(503)
            .header("content-type", "application/json")
            .body(r#"{"error":{"code":"storage_unavailable","message":"deployment store unavailable"}}"#);
    });

    let err = deployments::push(&ctx(&server), push_args())
        .await
        .expect_err("server failure");
    match err {
        CliError::Server(msg) => {
            assert!(msg.contains("503"), "{msg}");
            assert!(msg.contains("storage_unavailable"), "{msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn show_fetches_by_id() -> Result<(), CliError> {
    let server = MockServer::start();
    let id = Uuid::new_v4();
    let mock = server.mock(|when, then| {
        when.method("GET").path(format!("/deployments/{id}"));
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"{{"id":"{id}","source":"push","service_name":"checkout","version_or_tag":"v1","environment":"prod","artifact_identifier":null,"source_commit":null,"created_at":null,"completed_at":null,"duration_seconds":null,"workflow_metadata":{{}},"recorded_at":"2024-05-01T10:00:00Z"}}"#
            ));
    });

    deployments::show(&ctx(&server), id).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn list_forwards_filters() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/deployments")
            .query_param("limit", "5")
            .query_param("service", "checkout")
            .query_param("cursor", "abc");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"items":[],"next_cursor":null}"#);
    });

    let args = ListArgs {
        service: Some("checkout".into()),
        environment: None,
        limit: 5,
        cursor: Some("abc".into()),
    };
    deployments::list(&ctx(&server), args).await?;
    mock.assert();
    Ok(())
}
