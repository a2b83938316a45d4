//! Application services: ingestion, ledger reads, and reporting.

pub mod error;
pub mod ingest;
pub mod ledger;
pub mod normalize;
pub mod pagination;
pub mod report;
pub mod repos;
