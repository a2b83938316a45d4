pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
};

use crate::application::error::AppError;

use self::middleware::{log_responses, set_request_context};

async fn health(State(state): State<ApiState>) -> Result<StatusCode, AppError> {
    state.ledger.health_check().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assemble the full service router: ingestion, lookups, and health.
pub fn build_router(state: ApiState, max_body_bytes: usize) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .with_state(state.clone());

    build_api_router(state)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
