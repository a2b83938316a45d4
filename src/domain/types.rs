//! Shared domain enumerations aligned with persisted database enums.

/// Mirrors Postgres enum `deployment_source`.
pub use deployledger_api_types::DeploymentSource;
