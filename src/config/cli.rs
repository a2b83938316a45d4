use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::application::report::MAX_REPORT_DAYS;
use crate::domain::types::DeploymentSource;

/// Command-line arguments for the deployledger binary.
#[derive(Debug, Parser)]
#[command(
    name = "deployledger",
    version,
    about = "Deployment event ledger for DORA metrics"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "DEPLOYLEDGER_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the ingestion HTTP service.
    Serve(Box<ServeArgs>),
    /// Feed a logged raw payload back through the ingestion path.
    Replay(ReplayArgs),
    /// Print the deployment-frequency report as JSON.
    Report(ReportArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the request body limit in bytes.
    #[arg(long = "server-max-body-bytes", value_name = "BYTES")]
    pub server_max_body_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the per-invocation ingestion timeout.
    #[arg(long = "ingest-timeout-seconds", value_name = "SECONDS")]
    pub ingest_timeout_seconds: Option<u64>,

    /// Override the environment assigned to lifecycle events that name none.
    #[arg(long = "ingest-default-environment", value_name = "NAME")]
    pub ingest_default_environment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReplaySource {
    Push,
    Lifecycle,
}

impl From<ReplaySource> for DeploymentSource {
    fn from(source: ReplaySource) -> Self {
        match source {
            ReplaySource::Push => DeploymentSource::Push,
            ReplaySource::Lifecycle => DeploymentSource::Lifecycle,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Ingestion path the payload originally arrived on.
    #[arg(long, value_enum)]
    pub source: ReplaySource,

    /// Idempotency key to apply to a replayed push.
    #[arg(long = "idempotency-key", value_name = "KEY")]
    pub idempotency_key: Option<String>,

    /// File holding the raw JSON payload.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Window length in days, ending now.
    #[arg(
        long,
        value_name = "DAYS",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_REPORT_DAYS))
    )]
    pub days: Option<u32>,

    /// Restrict the report to these environments; repeatable.
    #[arg(long = "environment", value_name = "ENV")]
    pub environments: Vec<String>,
}
