//! Public API for the betting-ledger analytics crate.
//!
//! Two stages, sequentially dependent: [`ingest`] turns an uploaded CSV
//! into typed rows, [`metrics`] reduces those rows (optionally narrowed by
//! a [`models::DateRange`]) into a [`models::MetricsSnapshot`] and
//! per-event aggregates ready for chart binding.

pub mod errors;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod session;

pub use errors::{IngestError, Result, RowError, RowErrorKind};
pub use ingest::{DateFormat, Ingest, parse_transactions};
pub use metrics::{
    compute_event_aggregates, compute_metrics, filter_by_date_range, top_losses, top_profitable,
};
pub use models::{
    ChartPoint, DateRange, EventAggregate, MetricsSnapshot, TransactionRecord, TxKind,
};
pub use session::RefreshGate;
