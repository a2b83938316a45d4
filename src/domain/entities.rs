//! Ledger entities mirrored from persistent storage.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{error::DomainError, types::DeploymentSource};

/// Canonical deployment notification, independent of the source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentEvent {
    pub id: Uuid,
    pub source: DeploymentSource,
    pub service_name: String,
    pub version_or_tag: String,
    pub environment: String,
    pub artifact_identifier: Option<String>,
    pub source_commit: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub duration_seconds: Option<f64>,
    pub workflow_metadata: Value,
    /// Fingerprint of the source event; equal keys denote the same physical deployment.
    pub dedupe_key: Option<String>,
}

impl DeploymentEvent {
    /// Check the invariants every stored record must satisfy.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.service_name.trim().is_empty() {
            return Err(DomainError::validation("service_name must not be empty"));
        }
        if self.environment.trim().is_empty() {
            return Err(DomainError::validation("environment must not be empty"));
        }

        if let (Some(created_at), Some(completed_at)) = (self.created_at, self.completed_at) {
            if completed_at < created_at {
                return Err(DomainError::validation(
                    "completed_at must not be earlier than created_at",
                ));
            }
        }

        match (self.duration_seconds, self.created_at, self.completed_at) {
            (Some(duration), Some(created_at), Some(completed_at)) => {
                let expected = elapsed_seconds(created_at, completed_at);
                if duration < 0.0 || (duration - expected).abs() > f64::EPSILON {
                    return Err(DomainError::invariant(format!(
                        "duration_seconds {duration} does not match recorded timing {expected}"
                    )));
                }
            }
            (Some(_), _, _) => {
                return Err(DomainError::invariant(
                    "duration_seconds requires both created_at and completed_at",
                ));
            }
            (None, _, _) => {}
        }

        Ok(())
    }
}

/// A deployment as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentRecord {
    pub id: Uuid,
    pub source: DeploymentSource,
    pub service_name: String,
    pub version_or_tag: String,
    pub environment: String,
    pub artifact_identifier: Option<String>,
    pub source_commit: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub duration_seconds: Option<f64>,
    pub workflow_metadata: Value,
    pub dedupe_key: Option<String>,
    pub recorded_at: OffsetDateTime,
}

impl DeploymentRecord {
    pub fn from_event(event: DeploymentEvent, recorded_at: OffsetDateTime) -> Self {
        Self {
            id: event.id,
            source: event.source,
            service_name: event.service_name,
            version_or_tag: event.version_or_tag,
            environment: event.environment,
            artifact_identifier: event.artifact_identifier,
            source_commit: event.source_commit,
            created_at: event.created_at,
            completed_at: event.completed_at,
            duration_seconds: event.duration_seconds,
            workflow_metadata: event.workflow_metadata,
            dedupe_key: event.dedupe_key,
            recorded_at,
        }
    }
}

/// Seconds between two instants, including the fractional part.
pub fn elapsed_seconds(start: OffsetDateTime, end: OffsetDateTime) -> f64 {
    (end - start).as_seconds_f64()
}
