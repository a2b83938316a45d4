use std::{process, sync::Arc};

use deployledger::{
    application::{
        error::AppError,
        ingest::{IngestConfig, IngestService},
        ledger::LedgerService,
        report::ReportService,
        repos::DeploymentsRepo,
    },
    config,
    domain::types::DeploymentSource,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Replay(args) => run_replay(settings, args).await,
        config::Command::Report(args) => run_report(settings, args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await?;
    PostgresRepositories::run_migrations(&pool).await?;

    Ok(Arc::new(
        PostgresRepositories::new(pool).with_write_timeout(settings.ingest.write_timeout()),
    ))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let repo: Arc<dyn DeploymentsRepo> = repositories;

    let state = ApiState {
        ingest: Arc::new(IngestService::new(
            repo.clone(),
            IngestConfig::from(&settings.ingest),
        )),
        ledger: Arc::new(LedgerService::new(repo)),
    };
    let router = http::build_router(state, settings.server.max_body_bytes.get());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        addr = %settings.server.addr,
        timeout_ms = settings.ingest.timeout.as_millis() as u64,
        "deployledger listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

async fn run_replay(settings: config::Settings, args: config::ReplayArgs) -> Result<(), AppError> {
    let payload = tokio::fs::read(&args.file)
        .await
        .map_err(InfraError::from)?;

    let repositories = init_repositories(&settings).await?;
    let ingest = IngestService::new(repositories, IngestConfig::from(&settings.ingest));

    let outcome = match DeploymentSource::from(args.source) {
        DeploymentSource::Push => {
            ingest
                .accept_push(&payload, args.idempotency_key.as_deref())
                .await?
        }
        DeploymentSource::Lifecycle => ingest.accept_lifecycle(&payload).await?,
    };

    let summary = serde_json::json!({
        "id": outcome.id(),
        "duplicate": outcome.is_duplicate(),
    });
    println!("{summary}");
    Ok(())
}

async fn run_report(settings: config::Settings, args: config::ReportArgs) -> Result<(), AppError> {
    let days = args.days.unwrap_or(settings.report.default_days.get());

    let repositories = init_repositories(&settings).await?;
    let report = ReportService::new(repositories)
        .deployment_frequency(OffsetDateTime::now_utc(), days, &args.environments)
        .await?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| AppError::unexpected(format!("failed to render report: {err}")))?;
    println!("{rendered}");
    Ok(())
}
