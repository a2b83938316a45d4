use serde::Deserialize;

use deployledger_api_types::{DeploymentListResponse, DeploymentView};

use crate::application::pagination::CursorPage;
use crate::domain::entities::DeploymentRecord;

#[derive(Debug, Default, Deserialize)]
pub struct DeploymentListQuery {
    pub service: Option<String>,
    pub environment: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtifactQuery {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub artifact: String,
}

pub fn record_to_view(record: DeploymentRecord) -> DeploymentView {
    DeploymentView {
        id: record.id,
        source: record.source,
        service_name: record.service_name,
        version_or_tag: record.version_or_tag,
        environment: record.environment,
        artifact_identifier: record.artifact_identifier,
        source_commit: record.source_commit,
        created_at: record.created_at,
        completed_at: record.completed_at,
        duration_seconds: record.duration_seconds,
        workflow_metadata: record.workflow_metadata,
        recorded_at: record.recorded_at,
    }
}

pub fn page_to_response(page: CursorPage<DeploymentRecord>) -> DeploymentListResponse {
    let page = page.map(record_to_view);
    DeploymentListResponse {
        items: page.items,
        next_cursor: page.next_cursor,
    }
}
