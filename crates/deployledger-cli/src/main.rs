//! deployledger-cli: reports CI deployments to a deployledger server and looks them up.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;

#[cfg(test)]
mod tests;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::deployments;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Push(args) => deployments::push(&ctx, args).await?,
        Commands::Show { id } => deployments::show(&ctx, id).await?,
        Commands::List(args) => deployments::list(&ctx, args).await?,
    }

    Ok(())
}
