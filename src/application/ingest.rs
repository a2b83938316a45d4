//! Ingestion of deployment notifications into the ledger.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deployledger_api_types::{DeploymentInfoRequest, LifecycleEnvelope};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::normalize::{NormalizeError, normalize_lifecycle, normalize_push};
use crate::application::repos::{DeploymentsRepo, PutOutcome, RepoError};
use crate::config::IngestSettings;
use crate::domain::entities::DeploymentEvent;
use crate::domain::types::DeploymentSource;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Rejected(#[from] NormalizeError),
    #[error("storage failure: {0}")]
    Storage(#[from] RepoError),
    #[error("ingestion did not finish within {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    /// Whether redelivering the same payload could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Rejected(_) => false,
            IngestError::Storage(err) => err.is_transient(),
            IngestError::Timeout(_) => true,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            IngestError::Rejected(err) => err.reason(),
            IngestError::Storage(err) if err.is_transient() => "storage",
            IngestError::Storage(_) => "storage_rejected",
            IngestError::Timeout(_) => "timeout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub timeout: Duration,
    pub default_environment: String,
}

impl From<&IngestSettings> for IngestConfig {
    fn from(settings: &IngestSettings) -> Self {
        Self {
            timeout: settings.timeout,
            default_environment: settings.default_environment.clone(),
        }
    }
}

/// Accepts raw notifications from both sources and writes them through the store.
///
/// Each call is independent: the only shared state is the injected repository.
#[derive(Clone)]
pub struct IngestService {
    repo: Arc<dyn DeploymentsRepo>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(repo: Arc<dyn DeploymentsRepo>, config: IngestConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Handle a `POST /deployment-info` body.
    pub async fn accept_push(
        &self,
        payload: &[u8],
        idempotency_key: Option<&str>,
    ) -> Result<PutOutcome, IngestError> {
        let result = self
            .bounded(async {
                let request: DeploymentInfoRequest =
                    serde_json::from_slice(payload).map_err(|err| {
                        NormalizeError::validation(format!("invalid deployment-info body: {err}"))
                    })?;
                let event = normalize_push(request, idempotency_key)?;
                self.store(event).await
            })
            .await;

        observe(DeploymentSource::Push, payload, &result);
        result
    }

    /// Handle an orchestrator lifecycle envelope.
    pub async fn accept_lifecycle(&self, payload: &[u8]) -> Result<PutOutcome, IngestError> {
        let result = self
            .bounded(async {
                let envelope: LifecycleEnvelope =
                    serde_json::from_slice(payload).map_err(|err| {
                        NormalizeError::malformed(format!("invalid lifecycle envelope: {err}"))
                    })?;
                let event =
                    normalize_lifecycle(&envelope.detail, &self.config.default_environment)?;
                self.store(event).await
            })
            .await;

        observe(DeploymentSource::Lifecycle, payload, &result);
        result
    }

    async fn bounded<F>(&self, work: F) -> Result<PutOutcome, IngestError>
    where
        F: Future<Output = Result<PutOutcome, IngestError>>,
    {
        match tokio::time::timeout(self.config.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(IngestError::Timeout(self.config.timeout)),
        }
    }

    async fn store(&self, event: DeploymentEvent) -> Result<PutOutcome, IngestError> {
        let started = Instant::now();
        let outcome = self.repo.put(event).await;
        histogram!("deployledger_store_write_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        Ok(outcome?)
    }
}

fn observe(source: DeploymentSource, payload: &[u8], result: &Result<PutOutcome, IngestError>) {
    let source_label = source.as_str();
    match result {
        Ok(PutOutcome::Inserted(id)) => {
            counter!("deployledger_ingest_accepted_total", "source" => source_label).increment(1);
            info!(
                target = "deployledger::ingest",
                source = source_label,
                id = %id,
                "deployment recorded"
            );
        }
        Ok(PutOutcome::Duplicate(id)) => {
            counter!("deployledger_ingest_duplicate_total", "source" => source_label).increment(1);
            info!(
                target = "deployledger::ingest",
                source = source_label,
                id = %id,
                "duplicate deployment ignored"
            );
        }
        Err(err @ IngestError::Rejected(_)) => {
            counter!(
                "deployledger_ingest_rejected_total",
                "source" => source_label,
                "reason" => err.reason()
            )
            .increment(1);
            warn!(
                target = "deployledger::ingest",
                source = source_label,
                reason = err.reason(),
                error = %err,
                payload = %String::from_utf8_lossy(payload),
                "deployment notification rejected"
            );
        }
        Err(err) => {
            counter!(
                "deployledger_ingest_failed_total",
                "source" => source_label,
                "reason" => err.reason()
            )
            .increment(1);
            if err.is_retryable() {
                error!(
                    target = "deployledger::ingest",
                    source = source_label,
                    reason = err.reason(),
                    error = %err,
                    payload = %String::from_utf8_lossy(payload),
                    "deployment notification could not be stored"
                );
            } else {
                error!(
                    target = "deployledger::ingest",
                    source = source_label,
                    reason = err.reason(),
                    error = %err,
                    payload = %String::from_utf8_lossy(payload),
                    "deployment notification refused by the store; redelivery will not help"
                );
            }
        }
    }
}
