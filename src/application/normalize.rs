//! Conversion of source-specific notifications into canonical ledger events.
//!
//! Normalization is pure: it never touches storage and never invents timing.
//! Absent timestamps stay absent; present ones must parse.

use deployledger_api_types::{DeploymentInfoRequest, LifecycleDetail};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

use crate::domain::{
    entities::{DeploymentEvent, elapsed_seconds},
    error::DomainError,
    types::DeploymentSource,
};

/// Workflow metadata keys that may carry the VCS revision, in lookup order.
const COMMIT_KEYS: [&str; 3] = ["sha", "commit", "source_commit"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("malformed event: {0}")]
    Malformed(String),
}

impl NormalizeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizeError::Validation(_) => "validation",
            NormalizeError::Malformed(_) => "malformed",
        }
    }
}

impl From<DomainError> for NormalizeError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } => Self::Validation(message),
            DomainError::Invariant { message } => Self::Malformed(message),
        }
    }
}

/// Map a CI push into a canonical event. Timing is left unset.
pub fn normalize_push(
    request: DeploymentInfoRequest,
    idempotency_key: Option<&str>,
) -> Result<DeploymentEvent, NormalizeError> {
    let DeploymentInfoRequest {
        stage,
        service_name,
        tag,
        workflow_info,
    } = request;

    let service_name = required_text("service_name", Some(service_name))?;
    let environment = required_text("stage", Some(stage))?;
    let source_commit = commit_from_workflow(&workflow_info);
    let dedupe_key = idempotency_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| fingerprint(&["push", key]));

    let event = DeploymentEvent {
        id: Uuid::new_v4(),
        source: DeploymentSource::Push,
        service_name,
        version_or_tag: tag,
        environment,
        artifact_identifier: None,
        source_commit,
        created_at: None,
        completed_at: None,
        duration_seconds: None,
        workflow_metadata: Value::Object(workflow_info),
        dedupe_key,
    };
    event.validate()?;
    Ok(event)
}

/// Map an orchestrator steady-state notification into a canonical event.
///
/// `default_environment` applies when the notification does not name one.
pub fn normalize_lifecycle(
    detail: &LifecycleDetail,
    default_environment: &str,
) -> Result<DeploymentEvent, NormalizeError> {
    let service_name = required_text("service", detail.service.clone())?;
    let artifact = required_text("taskDefinitionArn", detail.task_definition_arn.clone())?;
    let created_raw = required_text("createdAt", detail.created_at.clone())?;
    let completed_raw = required_text("completedAt", detail.completed_at.clone())?;

    let created_at = parse_timestamp("createdAt", &created_raw)?;
    let completed_at = parse_timestamp("completedAt", &completed_raw)?;
    if completed_at < created_at {
        return Err(NormalizeError::validation(format!(
            "completedAt `{completed_raw}` precedes createdAt `{created_raw}`"
        )));
    }

    let environment = detail
        .environment
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_environment)
        .to_string();

    let dedupe_key = fingerprint(&[
        "lifecycle",
        &service_name,
        &artifact,
        &created_at.unix_timestamp_nanos().to_string(),
        &completed_at.unix_timestamp_nanos().to_string(),
    ]);

    let event = DeploymentEvent {
        id: Uuid::new_v4(),
        source: DeploymentSource::Lifecycle,
        service_name,
        version_or_tag: revision_label(&artifact).to_string(),
        environment,
        artifact_identifier: Some(artifact),
        source_commit: None,
        created_at: Some(created_at),
        completed_at: Some(completed_at),
        duration_seconds: Some(elapsed_seconds(created_at, completed_at)),
        workflow_metadata: Value::Object(Map::new()),
        dedupe_key: Some(dedupe_key),
    };
    event.validate()?;
    Ok(event)
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// Offsets are honoured; a timestamp without an offset is read as UTC.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<OffsetDateTime, NormalizeError> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed.to_offset(UtcOffset::UTC));
    }

    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(raw, naive)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|err| NormalizeError::malformed(format!("{field} `{raw}` is not ISO-8601: {err}")))
}

/// Present and not blank. The value is returned exactly as received.
fn required_text(field: &'static str, value: Option<String>) -> Result<String, NormalizeError> {
    match value {
        None => Err(NormalizeError::validation(format!("missing field `{field}`"))),
        Some(value) if value.trim().is_empty() => Err(NormalizeError::validation(format!(
            "field `{field}` must not be empty"
        ))),
        Some(value) => Ok(value),
    }
}

fn commit_from_workflow(workflow_info: &Map<String, Value>) -> Option<String> {
    COMMIT_KEYS.iter().find_map(|key| {
        workflow_info
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Revision suffix of a task-definition identifier (`...:42` → `42`).
fn revision_label(artifact: &str) -> &str {
    match artifact.rsplit_once(':') {
        Some((_, revision)) if !revision.is_empty() => revision,
        _ => artifact,
    }
}

fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}
