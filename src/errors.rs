use std::time::Duration;

use thiserror::Error;

/// Failures raised by the installment store and the external feeds it reads from.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Error type returned by cycle and reporting operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns `true` when the error was raised before any write was attempted.
    ///
    /// Store failures return `false`: the caller cannot assume the ledger is untouched
    /// and should re-read before retrying.
    pub fn state_unchanged(&self) -> bool {
        !matches!(self, LedgerError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why a legacy paging loop stopped before the source was exhausted.
#[derive(Debug, Error)]
pub enum PartialCause {
    #[error("page fetch failed: {0}")]
    FetchFailed(#[source] StoreError),
    #[error("page fetch exceeded {0:?}")]
    TimedOut(Duration),
    #[error("paging cancelled")]
    Cancelled,
}

/// Non-fatal warning attached to reconciled records when legacy paging stopped early.
///
/// The records returned alongside it hold every row fetched before the failing page.
#[derive(Debug, Error)]
#[error("legacy aggregation incomplete after {pages_fetched} page(s), {rows_kept} row(s) kept: {cause}")]
pub struct PartialAggregationError {
    pub pages_fetched: usize,
    pub rows_kept: usize,
    #[source]
    pub cause: PartialCause,
}
