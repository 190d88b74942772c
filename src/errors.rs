//! Error taxonomy for ingestion, plus the crate-wide `Result` alias.
//!
//! Fatal errors abort the whole upload and are surfaced as a structured
//! enum so the caller can show a specific message. Row-level problems are
//! not errors in this sense: they are collected as [`RowError`]s alongside
//! the accepted rows and reported as a warning summary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Fatal ingestion failures. Any of these means zero rows were accepted.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The content could not be parsed as delimited text at all.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// One or more required headers are absent. Carries exactly the
    /// missing names, in required-header order.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Header present (or nothing at all) but zero data rows.
    #[error("the file is empty or contains no data rows")]
    EmptyFile,
}

/// Why an individual row was dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    /// A required field was empty. Carries the header name.
    MissingField(String),
    /// The `Time` value did not parse under the declared date format.
    UnparseableTime(String),
    /// The `Amount` value was not numeric after stripping formatting.
    UnparseableAmount(String),
    /// A row with this `Transaction Id` was already accepted.
    DuplicateTransactionId(String),
}

impl std::fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowErrorKind::MissingField(name) => write!(f, "missing required field `{name}`"),
            RowErrorKind::UnparseableTime(value) => write!(f, "unparseable time `{value}`"),
            RowErrorKind::UnparseableAmount(value) => write!(f, "unparseable amount `{value}`"),
            RowErrorKind::DuplicateTransactionId(id) => {
                write!(f, "duplicate transaction id `{id}`")
            }
        }
    }
}

/// A dropped row: 1-based data-row number (first row after the header is
/// row 1) plus the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub kind: RowErrorKind,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.kind)
    }
}
