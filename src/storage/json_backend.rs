use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use uuid::Uuid;

use super::memory::{add_account_to, apply_patch, insert_into, select, MemoryLedgerStore};
use super::{AccountDirectory, InstallmentStore, LedgerSnapshot, StoreResult};
use crate::domain::{Account, Installment, InstallmentId};
use crate::ledger::{InstallmentFilter, InstallmentPatch};
use crate::utils::persistence::write_file_atomically;

/// Installment store persisted as a single JSON snapshot.
///
/// Mutations are staged in memory, written to disk, and only then published to
/// readers; a failed write leaves both the file and the in-memory view unchanged.
#[derive(Debug)]
pub struct JsonLedgerStore {
    path: PathBuf,
    inner: MemoryLedgerStore,
}

impl JsonLedgerStore {
    /// Opens the snapshot at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            load_snapshot_from_path(&path)?
        } else {
            LedgerSnapshot::default()
        };
        info!(path = %path.display(), installments = snapshot.installments.len(), "ledger snapshot opened");
        Ok(Self {
            path,
            inner: MemoryLedgerStore::from_snapshot(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        self.inner.snapshot()
    }

    pub fn add_account(&self, account: Account) -> StoreResult<Uuid> {
        self.inner
            .transact(|snapshot| add_account_to(snapshot, account), |staged| self.persist(staged))
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> StoreResult<()> {
        save_snapshot_to_path(snapshot, &self.path)?;
        debug!(path = %self.path.display(), "ledger snapshot written");
        Ok(())
    }
}

impl InstallmentStore for JsonLedgerStore {
    fn query(&self, filter: &InstallmentFilter) -> StoreResult<Vec<Installment>> {
        let snapshot = self.inner.read()?;
        Ok(select(&snapshot, filter))
    }

    fn count(&self, filter: &InstallmentFilter) -> StoreResult<usize> {
        self.inner.count(filter)
    }

    fn bulk_update(
        &self,
        filter: &InstallmentFilter,
        patch: &InstallmentPatch,
    ) -> StoreResult<usize> {
        self.inner.transact(
            |snapshot| apply_patch(snapshot, filter, patch),
            |staged| self.persist(staged),
        )
    }

    fn insert(&self, installment: Installment) -> StoreResult<InstallmentId> {
        self.inner.transact(
            |snapshot| insert_into(snapshot, installment),
            |staged| self.persist(staged),
        )
    }
}

impl AccountDirectory for JsonLedgerStore {
    fn display_name(&self, account_id: Uuid) -> StoreResult<Option<String>> {
        self.inner.display_name(account_id)
    }
}

pub fn save_snapshot_to_path(snapshot: &LedgerSnapshot, path: &Path) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    write_file_atomically(path, &json)?;
    Ok(())
}

pub fn load_snapshot_from_path(path: &Path) -> StoreResult<LedgerSnapshot> {
    let data = fs::read_to_string(path)?;
    let mut snapshot: LedgerSnapshot = serde_json::from_str(&data)?;
    snapshot.normalize();
    Ok(snapshot)
}
