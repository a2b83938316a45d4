//! Wire types shared by the deployledger server and its command-line client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Header carrying a caller-chosen key that makes repeated pushes idempotent.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Which ingestion path produced a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "deployment_source", rename_all = "snake_case")
)]
pub enum DeploymentSource {
    Push,
    Lifecycle,
}

impl DeploymentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentSource::Push => "push",
            DeploymentSource::Lifecycle => "lifecycle",
        }
    }
}

/// Body of `POST /deployment-info`, sent by CI workflows after a rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfoRequest {
    pub stage: String,
    pub service_name: String,
    pub tag: String,
    #[serde(default)]
    pub workflow_info: Map<String, Value>,
}

/// Response of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentAccepted {
    pub id: Uuid,
    /// True when the push matched an already recorded deployment.
    pub duplicate: bool,
}

/// Event-bus envelope around an orchestrator lifecycle notification.
///
/// Only `detail` is interpreted; the remaining envelope fields are kept for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "detail-type")]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    pub detail: LifecycleDetail,
}

/// "Deployment reached steady state" payload.
///
/// Every field is optional on the wire so that absence can be reported as a
/// validation failure rather than a generic decoding error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleDetail {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, rename = "taskDefinitionArn")]
    pub task_definition_arn: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "completedAt")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

/// A recorded deployment as returned by the lookup endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentView {
    pub id: Uuid,
    pub source: DeploymentSource,
    pub service_name: String,
    pub version_or_tag: String,
    pub environment: String,
    pub artifact_identifier: Option<String>,
    pub source_commit: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub duration_seconds: Option<f64>,
    pub workflow_metadata: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentListResponse {
    pub items: Vec<DeploymentView>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
