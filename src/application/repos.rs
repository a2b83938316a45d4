//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, DeploymentCursor, PageRequest, PaginationError};
use crate::domain::entities::{DeploymentEvent, DeploymentRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Outages and timeouts may clear up; constraint and input errors will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Persistence(_) | RepoError::Timeout)
    }
}

/// Result of writing one event to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new record was created with this id.
    Inserted(Uuid),
    /// An equivalent event was already recorded under this id; nothing was written.
    Duplicate(Uuid),
}

impl PutOutcome {
    pub fn id(self) -> Uuid {
        match self {
            PutOutcome::Inserted(id) | PutOutcome::Duplicate(id) => id,
        }
    }

    pub fn is_duplicate(self) -> bool {
        matches!(self, PutOutcome::Duplicate(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentQueryFilter {
    pub service_name: Option<String>,
    pub environment: Option<String>,
}

/// Append-only store of canonical deployment records.
#[async_trait]
pub trait DeploymentsRepo: Send + Sync {
    /// Insert a record; redelivery of an event with a known `dedupe_key` must not
    /// create a second record.
    async fn put(&self, event: DeploymentEvent) -> Result<PutOutcome, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeploymentRecord>, RepoError>;

    async fn find_by_artifact(
        &self,
        service_name: &str,
        artifact_identifier: &str,
    ) -> Result<Vec<DeploymentRecord>, RepoError>;

    /// Newest first, ordered by `(recorded_at, id)`.
    async fn list(
        &self,
        filter: &DeploymentQueryFilter,
        page: PageRequest<DeploymentCursor>,
    ) -> Result<CursorPage<DeploymentRecord>, RepoError>;

    /// Records whose deployment instant falls in `[start, end)`.
    ///
    /// The deployment instant is `completed_at`, falling back to `recorded_at`
    /// for sources that do not report timing.
    async fn list_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<DeploymentRecord>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}
