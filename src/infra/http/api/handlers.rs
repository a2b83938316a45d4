use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use deployledger_api_types::{DeploymentAccepted, IDEMPOTENCY_KEY_HEADER};
use uuid::Uuid;

use crate::application::repos::DeploymentQueryFilter;

use super::error::ApiError;
use super::models::{ArtifactQuery, DeploymentListQuery, page_to_response, record_to_view};
use super::state::ApiState;

fn idempotency_key(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    match headers.get(IDEMPOTENCY_KEY_HEADER) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            ApiError::validation_failed("Idempotency-Key must be visible ASCII")
        }),
    }
}

/// `POST /deployment-info`: CI push of a finished rollout.
pub async fn push_deployment(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body?;
    let key = idempotency_key(&headers)?;
    let outcome = state.ingest.accept_push(&body, key).await?;

    Ok(Json(DeploymentAccepted {
        id: outcome.id(),
        duplicate: outcome.is_duplicate(),
    }))
}

/// `POST /events/lifecycle`: orchestrator steady-state notification.
///
/// Rejected and refused events are acknowledged once logged; only failures a
/// redelivery could fix surface as errors.
pub async fn lifecycle_event(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError> {
    let body = body?;
    match state.ingest.accept_lifecycle(&body).await {
        Ok(_) => Ok(StatusCode::ACCEPTED),
        Err(err) if !err.is_retryable() => Ok(StatusCode::ACCEPTED),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_deployment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|err| ApiError::bad_request("Invalid deployment id", Some(err.to_string())))?;
    let record = state.ledger.find(id).await?;
    Ok(Json(record_to_view(record)))
}

pub async fn list_deployments(
    State(state): State<ApiState>,
    query: Result<Query<DeploymentListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let filter = DeploymentQueryFilter {
        service_name: query.service,
        environment: query.environment,
    };
    let page = state
        .ledger
        .list(filter, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(page_to_response(page)))
}

pub async fn deployments_by_artifact(
    State(state): State<ApiState>,
    query: Result<Query<ArtifactQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let records = state
        .ledger
        .by_artifact(&query.service, &query.artifact)
        .await?;
    Ok(Json(
        records.into_iter().map(record_to_view).collect::<Vec<_>>(),
    ))
}
