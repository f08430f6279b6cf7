#![doc(test(attr(deny(warnings))))]

//! Tuition Ledger manages installment cycles for per-student billing and reconciles
//! the active ledger with migrated legacy data into financial reports.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{LedgerError, PartialAggregationError, StoreError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Tuition ledger tracing initialized.");
    });
}
