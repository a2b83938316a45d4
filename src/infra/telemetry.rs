use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every ingestion metric. Safe to call repeatedly.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "deployledger_ingest_accepted_total",
            Unit::Count,
            "Deployment notifications recorded as new ledger entries."
        );
        describe_counter!(
            "deployledger_ingest_duplicate_total",
            Unit::Count,
            "Redelivered notifications matched to an existing ledger entry."
        );
        describe_counter!(
            "deployledger_ingest_rejected_total",
            Unit::Count,
            "Notifications dropped because they failed validation or could not be parsed."
        );
        describe_counter!(
            "deployledger_ingest_failed_total",
            Unit::Count,
            "Notifications that could not be stored because of a storage failure or timeout."
        );
        describe_histogram!(
            "deployledger_store_write_ms",
            Unit::Milliseconds,
            "Latency of a single ledger write in milliseconds."
        );
    });
}
