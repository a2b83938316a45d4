//! Read side of the deployment ledger.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{
    CursorPage, DeploymentCursor, PageRequest, PaginationError,
};
use crate::application::repos::{DeploymentQueryFilter, DeploymentsRepo, RepoError};
use crate::domain::entities::DeploymentRecord;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("deployment `{0}` not found")]
    NotFound(Uuid),
    #[error("{0} must not be empty")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct LedgerService {
    repo: Arc<dyn DeploymentsRepo>,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn DeploymentsRepo>) -> Self {
        Self { repo }
    }

    pub async fn find(&self, id: Uuid) -> Result<DeploymentRecord, LedgerError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    /// Page through records, newest first.
    ///
    /// `limit` is clamped to `1..=MAX_PAGE_LIMIT`; a missing limit uses the default page size.
    pub async fn list(
        &self,
        filter: DeploymentQueryFilter,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<CursorPage<DeploymentRecord>, LedgerError> {
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let cursor = cursor.map(DeploymentCursor::decode).transpose()?;
        let filter = DeploymentQueryFilter {
            service_name: non_blank(filter.service_name),
            environment: non_blank(filter.environment),
        };

        Ok(self
            .repo
            .list(&filter, PageRequest::new(limit, cursor))
            .await?)
    }

    /// Every record of one artifact of one service, oldest first.
    pub async fn by_artifact(
        &self,
        service_name: &str,
        artifact_identifier: &str,
    ) -> Result<Vec<DeploymentRecord>, LedgerError> {
        let service_name = service_name.trim();
        let artifact_identifier = artifact_identifier.trim();
        if service_name.is_empty() {
            return Err(LedgerError::MissingParameter("service"));
        }
        if artifact_identifier.is_empty() {
            return Err(LedgerError::MissingParameter("artifact"));
        }

        Ok(self
            .repo
            .find_by_artifact(service_name, artifact_identifier)
            .await?)
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.repo.health_check().await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
