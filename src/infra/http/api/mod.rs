pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/deployment-info", post(handlers::push_deployment))
        .route("/events/lifecycle", post(handlers::lifecycle_event))
        .route("/deployments", get(handlers::list_deployments))
        .route(
            "/deployments/by-artifact",
            get(handlers::deployments_by_artifact),
        )
        .route("/deployments/{id}", get(handlers::get_deployment))
        .with_state(state)
}
