use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, DeploymentCursor, PageRequest};
use crate::application::repos::{DeploymentQueryFilter, DeploymentsRepo, PutOutcome, RepoError};
use crate::domain::entities::{DeploymentEvent, DeploymentRecord};
use crate::domain::error::DomainError;
use crate::domain::types::DeploymentSource;

use super::{PostgresRepositories, map_sqlx_error};

const SELECT_COLUMNS: &str = "SELECT id, source, service_name, version_or_tag, environment, \
     artifact_identifier, source_commit, created_at, completed_at, duration_seconds, \
     workflow_metadata, dedupe_key, recorded_at FROM deployment_events";

#[derive(FromRow)]
struct DeploymentRow {
    id: Uuid,
    source: DeploymentSource,
    service_name: String,
    version_or_tag: String,
    environment: String,
    artifact_identifier: Option<String>,
    source_commit: Option<String>,
    created_at: Option<OffsetDateTime>,
    completed_at: Option<OffsetDateTime>,
    duration_seconds: Option<f64>,
    workflow_metadata: Value,
    dedupe_key: Option<String>,
    recorded_at: OffsetDateTime,
}

impl From<DeploymentRow> for DeploymentRecord {
    fn from(row: DeploymentRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            service_name: row.service_name,
            version_or_tag: row.version_or_tag,
            environment: row.environment,
            artifact_identifier: row.artifact_identifier,
            source_commit: row.source_commit,
            created_at: row.created_at,
            completed_at: row.completed_at,
            duration_seconds: row.duration_seconds,
            workflow_metadata: row.workflow_metadata,
            dedupe_key: row.dedupe_key,
            recorded_at: row.recorded_at,
        }
    }
}

fn invalid_event(err: DomainError) -> RepoError {
    RepoError::InvalidInput {
        message: err.to_string(),
    }
}

#[async_trait]
impl DeploymentsRepo for PostgresRepositories {
    async fn put(&self, event: DeploymentEvent) -> Result<PutOutcome, RepoError> {
        event.validate().map_err(invalid_event)?;

        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        if let Some(timeout) = self.write_timeout() {
            sqlx::query("SELECT set_config('statement_timeout', $1, true)")
                .bind(format!("{}ms", timeout.as_millis().max(1)))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO deployment_events (id, source, service_name, version_or_tag, \
             environment, artifact_identifier, source_commit, created_at, completed_at, \
             duration_seconds, workflow_metadata, dedupe_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (dedupe_key) DO NOTHING \
             RETURNING id",
        )
        .bind(event.id)
        .bind(event.source)
        .bind(&event.service_name)
        .bind(&event.version_or_tag)
        .bind(&event.environment)
        .bind(&event.artifact_identifier)
        .bind(&event.source_commit)
        .bind(event.created_at)
        .bind(event.completed_at)
        .bind(event.duration_seconds)
        .bind(&event.workflow_metadata)
        .bind(&event.dedupe_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(id) = inserted {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(PutOutcome::Inserted(id));
        }

        // Only a dedupe_key conflict suppresses the insert.
        let Some(dedupe_key) = event.dedupe_key.as_deref() else {
            return Err(RepoError::Integrity {
                message: "insert without dedupe key returned no row".to_string(),
            });
        };

        let existing: Uuid =
            sqlx::query_scalar("SELECT id FROM deployment_events WHERE dedupe_key = $1")
                .bind(dedupe_key)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(PutOutcome::Duplicate(existing))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeploymentRecord>, RepoError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, DeploymentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(DeploymentRecord::from))
    }

    async fn find_by_artifact(
        &self,
        service_name: &str,
        artifact_identifier: &str,
    ) -> Result<Vec<DeploymentRecord>, RepoError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE service_name = $1 AND artifact_identifier = $2 \
             ORDER BY recorded_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, DeploymentRow>(&sql)
            .bind(service_name)
            .bind(artifact_identifier)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DeploymentRecord::from).collect())
    }

    async fn list(
        &self,
        filter: &DeploymentQueryFilter,
        page: PageRequest<DeploymentCursor>,
    ) -> Result<CursorPage<DeploymentRecord>, RepoError> {
        let limit = i64::from(page.limit.max(1));

        let mut qb = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE 1=1 ");

        if let Some(service_name) = filter.service_name.as_ref() {
            qb.push(" AND service_name = ");
            qb.push_bind(service_name);
        }
        if let Some(environment) = filter.environment.as_ref() {
            qb.push(" AND environment = ");
            qb.push_bind(environment);
        }
        if let Some(cursor) = page.cursor {
            qb.push(" AND (recorded_at, id) < (");
            qb.push_bind(cursor.recorded_at());
            qb.push(", ");
            qb.push_bind(cursor.id());
            qb.push(")");
        }

        qb.push(" ORDER BY recorded_at DESC, id DESC LIMIT ");
        qb.push_bind(limit + 1);

        let mut rows = qb
            .build_query_as::<DeploymentRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let has_more = (rows.len() as i64) > limit;
        if has_more {
            rows.pop();
        }

        let next_cursor = if has_more {
            rows.last()
                .map(|last| DeploymentCursor::new(last.recorded_at, last.id).encode())
        } else {
            None
        };

        Ok(CursorPage::new(
            rows.into_iter().map(DeploymentRecord::from).collect(),
            next_cursor,
        ))
    }

    async fn list_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<DeploymentRecord>, RepoError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE COALESCE(completed_at, recorded_at) >= $1 \
             AND COALESCE(completed_at, recorded_at) < $2 \
             ORDER BY COALESCE(completed_at, recorded_at) ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, DeploymentRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DeploymentRecord::from).collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
