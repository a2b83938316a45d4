mod common;

use std::collections::HashMap;
use std::sync::Arc;

use deployledger::application::ingest::IngestService;
use deployledger::infra::telemetry;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;

use common::{InMemoryLedger, ingest_config};

const LIFECYCLE: &str = r#"{
    "detail": {
        "service": "checkout",
        "taskDefinitionArn": "arn:aws:ecs:us-east-1:1:task-definition/checkout:7",
        "createdAt": "2024-01-01T00:00:00Z",
        "completedAt": "2024-01-01T00:02:00Z"
    }
}"#;

#[tokio::test]
#[serial]
async fn ingestion_outcomes_emit_labelled_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let ledger = Arc::new(InMemoryLedger::default());
    let service = IngestService::new(ledger.clone(), ingest_config());

    service
        .accept_lifecycle(LIFECYCLE.as_bytes())
        .await
        .expect("first delivery");
    service
        .accept_lifecycle(LIFECYCLE.as_bytes())
        .await
        .expect("redelivery");
    service
        .accept_push(br#"{"stage":"prod","tag":"v1"}"#, None)
        .await
        .expect_err("missing service_name");

    ledger.set_unavailable(true);
    service
        .accept_push(
            br#"{"stage":"prod","service_name":"checkout","tag":"v1"}"#,
            None,
        )
        .await
        .expect_err("storage down");

    let mut counters: HashMap<(String, Vec<(String, String)>), u64> = HashMap::new();
    let mut histograms = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = composite_key.key();
        let mut labels: Vec<(String, String)> = key
            .labels()
            .map(|label| (label.key().to_string(), label.value().to_string()))
            .collect();
        labels.sort();
        match value {
            DebugValue::Counter(count) => {
                counters.insert((key.name().to_string(), labels), count);
            }
            DebugValue::Histogram(_) => histograms.push(key.name().to_string()),
            DebugValue::Gauge(_) => {}
        }
    }

    let label = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
    };

    assert_eq!(
        counters.get(&(
            "deployledger_ingest_accepted_total".to_string(),
            label(&[("source", "lifecycle")])
        )),
        Some(&1)
    );
    assert_eq!(
        counters.get(&(
            "deployledger_ingest_duplicate_total".to_string(),
            label(&[("source", "lifecycle")])
        )),
        Some(&1)
    );
    assert_eq!(
        counters.get(&(
            "deployledger_ingest_rejected_total".to_string(),
            label(&[("reason", "validation"), ("source", "push")])
        )),
        Some(&1)
    );
    assert_eq!(
        counters.get(&(
            "deployledger_ingest_failed_total".to_string(),
            label(&[("reason", "storage"), ("source", "push")])
        )),
        Some(&1)
    );
    assert!(
        histograms
            .iter()
            .any(|name| name == "deployledger_store_write_ms")
    );
}
