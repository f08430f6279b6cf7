//! Store abstractions consumed by the cycle and reconciliation services, plus the
//! in-process, JSON-file and CSV-export backends that implement them.

pub mod csv_feed;
pub mod json_backend;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, Expense, Installment, InstallmentId, LegacyRow};
use crate::errors::StoreError;
use crate::ledger::{InstallmentFilter, InstallmentPatch};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Typed query/update interface over the active installment partition.
pub trait InstallmentStore: Send + Sync {
    fn query(&self, filter: &InstallmentFilter) -> StoreResult<Vec<Installment>>;

    /// Applies `patch` to every row matching `filter` as a single atomic unit and
    /// returns how many rows were updated.
    fn bulk_update(&self, filter: &InstallmentFilter, patch: &InstallmentPatch)
        -> StoreResult<usize>;

    /// Stores a new installment, assigning and returning its identifier.
    fn insert(&self, installment: Installment) -> StoreResult<InstallmentId>;

    fn count(&self, filter: &InstallmentFilter) -> StoreResult<usize> {
        Ok(self.query(filter)?.len())
    }

    fn get(&self, id: InstallmentId) -> StoreResult<Option<Installment>> {
        let rows = self.query(&InstallmentFilter::new().ids([id]))?;
        Ok(rows.into_iter().next())
    }
}

/// Resolves account owners to display names for reports.
pub trait AccountDirectory: Send + Sync {
    fn display_name(&self, account_id: Uuid) -> StoreResult<Option<String>>;

    fn display_names(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>> {
        let mut names = HashMap::with_capacity(ids.len());
        for id in ids {
            if names.contains_key(id) {
                continue;
            }
            if let Some(name) = self.display_name(*id)? {
                names.insert(*id, name);
            }
        }
        Ok(names)
    }
}

/// Paged reader over the legacy/migrated partition, ordered by due date descending.
#[async_trait]
pub trait LegacySource: Send + Sync {
    async fn fetch_page(&self, offset: usize, limit: usize) -> StoreResult<Vec<LegacyRow>>;
}

/// Read-only feed of expenses used for balance computation.
#[async_trait]
pub trait ExpenseFeed: Send + Sync {
    async fn expenses(&self) -> StoreResult<Vec<Expense>>;
}

/// Serializable image of the active partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub next_id: InstallmentId,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            accounts: Vec::new(),
            installments: Vec::new(),
            next_id: 1,
        }
    }
}

impl LedgerSnapshot {
    /// Repairs the id counter of snapshots written by hand or by older versions.
    pub fn normalize(&mut self) {
        let max_id = self.installments.iter().map(|i| i.id).max().unwrap_or(0);
        if self.next_id <= max_id {
            self.next_id = max_id + 1;
        }
        self.schema_version = CURRENT_SCHEMA_VERSION;
    }
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

pub use csv_feed::{CsvExpenseFeed, CsvLegacySource};
pub use json_backend::JsonLedgerStore;
pub use memory::MemoryLedgerStore;
