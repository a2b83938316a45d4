#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use deployledger::application::ingest::{IngestConfig, IngestService};
use deployledger::application::ledger::LedgerService;
use deployledger::application::pagination::{CursorPage, DeploymentCursor, PageRequest};
use deployledger::application::repos::{
    DeploymentQueryFilter, DeploymentsRepo, PutOutcome, RepoError,
};
use deployledger::domain::entities::{DeploymentEvent, DeploymentRecord};
use deployledger::infra::http::{ApiState, build_router};

/// Ledger kept in memory; `set_unavailable` simulates a storage outage and
/// `set_refusing` a write the store rejects outright.
#[derive(Default)]
pub struct InMemoryLedger {
    records: Mutex<Vec<DeploymentRecord>>,
    unavailable: AtomicBool,
    refusing: AtomicBool,
}

impl InMemoryLedger {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<DeploymentRecord> {
        self.records.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeploymentsRepo for InMemoryLedger {
    async fn put(&self, event: DeploymentEvent) -> Result<PutOutcome, RepoError> {
        self.check_available()?;
        if self.refusing.load(Ordering::SeqCst) {
            return Err(RepoError::Integrity {
                message: "violates check constraint".to_string(),
            });
        }
        event.validate().map_err(|err| RepoError::InvalidInput {
            message: err.to_string(),
        })?;

        let mut records = self.records.lock().await;
        if let Some(key) = event.dedupe_key.as_deref() {
            if let Some(existing) = records
                .iter()
                .find(|record| record.dedupe_key.as_deref() == Some(key))
            {
                return Ok(PutOutcome::Duplicate(existing.id));
            }
        }

        // Strictly increasing so listing order is deterministic.
        let recorded_at = OffsetDateTime::now_utc()
            + time::Duration::milliseconds(records.len() as i64);
        let id = event.id;
        records.push(DeploymentRecord::from_event(event, recorded_at));
        Ok(PutOutcome::Inserted(id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeploymentRecord>, RepoError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }

    async fn find_by_artifact(
        &self,
        service_name: &str,
        artifact_identifier: &str,
    ) -> Result<Vec<DeploymentRecord>, RepoError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|record| {
                record.service_name == service_name
                    && record.artifact_identifier.as_deref() == Some(artifact_identifier)
            })
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        filter: &DeploymentQueryFilter,
        page: PageRequest<DeploymentCursor>,
    ) -> Result<CursorPage<DeploymentRecord>, RepoError> {
        self.check_available()?;
        let records = self.records.lock().await;
        let mut matching: Vec<DeploymentRecord> = records
            .iter()
            .filter(|record| {
                filter
                    .service_name
                    .as_deref()
                    .is_none_or(|service| record.service_name == service)
                    && filter
                        .environment
                        .as_deref()
                        .is_none_or(|environment| record.environment == environment)
            })
            .filter(|record| match page.cursor {
                Some(cursor) => (record.recorded_at, record.id) < (cursor.recorded_at(), cursor.id()),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));

        let limit = page.limit.max(1) as usize;
        let next_cursor = if matching.len() > limit {
            matching.truncate(limit);
            matching
                .last()
                .map(|last| DeploymentCursor::new(last.recorded_at, last.id).encode())
        } else {
            None
        };

        Ok(CursorPage::new(matching, next_cursor))
    }

    async fn list_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<DeploymentRecord>, RepoError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|record| {
                let instant = record.completed_at.unwrap_or(record.recorded_at);
                instant >= start && instant < end
            })
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.check_available()
    }
}

pub const TEST_BODY_LIMIT: usize = 64 * 1024;

pub fn ingest_config() -> IngestConfig {
    IngestConfig {
        timeout: Duration::from_secs(10),
        default_environment: "production".to_string(),
    }
}

pub fn router_with(ledger: Arc<InMemoryLedger>) -> Router {
    let repo: Arc<dyn DeploymentsRepo> = ledger;
    let state = ApiState {
        ingest: Arc::new(IngestService::new(repo.clone(), ingest_config())),
        ledger: Arc::new(LedgerService::new(repo)),
    };
    build_router(state, TEST_BODY_LIMIT)
}
