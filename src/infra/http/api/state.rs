use std::sync::Arc;

use crate::application::ingest::IngestService;
use crate::application::ledger::LedgerService;

#[derive(Clone)]
pub struct ApiState {
    pub ingest: Arc<IngestService>,
    pub ledger: Arc<LedgerService>,
}
