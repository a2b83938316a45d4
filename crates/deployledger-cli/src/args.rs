//! Command-line surface for `deployledger-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "deployledger-cli",
    version,
    about = "Report and inspect deployments recorded by deployledger",
    long_about = None
)]
pub struct Cli {
    /// Server base URL, e.g. <https://deployledger.internal>
    #[arg(long, env = "DEPLOYLEDGER_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a finished rollout (typically the last step of a CI workflow)
    Push(PushArgs),
    /// Show one recorded deployment
    Show {
        #[arg(value_name = "ID")]
        id: Uuid,
    },
    /// List recorded deployments, newest first
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// Service that was deployed
    #[arg(long)]
    pub service: String,

    /// Deployment stage, e.g. prod or staging
    #[arg(long)]
    pub stage: String,

    /// Released tag or version
    #[arg(long)]
    pub tag: String,

    /// Workflow metadata entry as key=value; repeatable
    #[arg(long = "workflow", value_name = "KEY=VALUE")]
    pub workflow: Vec<String>,

    /// JSON object file with workflow metadata; --workflow entries override its keys
    #[arg(long = "workflow-file", value_name = "PATH")]
    pub workflow_file: Option<PathBuf>,

    /// Key that makes retries of this push idempotent
    #[arg(long = "idempotency-key", env = "DEPLOYLEDGER_IDEMPOTENCY_KEY")]
    pub idempotency_key: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub service: Option<String>,
    #[arg(long)]
    pub environment: Option<String>,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    #[arg(long)]
    pub cursor: Option<String>,
}
