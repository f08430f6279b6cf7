use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use super::{AccountDirectory, InstallmentStore, LedgerSnapshot, StoreResult};
use crate::domain::{Account, Identifiable, Installment, InstallmentId, NamedEntity};
use crate::errors::StoreError;
use crate::ledger::{InstallmentFilter, InstallmentPatch};

/// In-process installment store. Every mutation runs under one write lock, so a bulk
/// update is evaluated and applied without any reader observing a partial group.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: RwLock<LedgerSnapshot>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(mut snapshot: LedgerSnapshot) -> Self {
        snapshot.normalize();
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        Ok(self.read()?.clone())
    }

    pub fn add_account(&self, account: Account) -> StoreResult<Uuid> {
        self.transact(|snapshot| add_account_to(snapshot, account), |_| Ok(()))
    }

    /// Runs `op` against a staged copy of the snapshot and publishes the copy only when
    /// `commit` accepts it. Readers keep seeing the previous state until then.
    pub(crate) fn transact<T, F, C>(&self, op: F, commit: C) -> StoreResult<T>
    where
        F: FnOnce(&mut LedgerSnapshot) -> T,
        C: FnOnce(&LedgerSnapshot) -> StoreResult<()>,
    {
        let mut guard = self.write()?;
        let mut staged = guard.clone();
        let output = op(&mut staged);
        commit(&staged)?;
        *guard = staged;
        Ok(output)
    }

    pub(crate) fn read(&self) -> StoreResult<RwLockReadGuard<'_, LedgerSnapshot>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("installment store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, LedgerSnapshot>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("installment store lock poisoned".into()))
    }
}

impl InstallmentStore for MemoryLedgerStore {
    fn query(&self, filter: &InstallmentFilter) -> StoreResult<Vec<Installment>> {
        let snapshot = self.read()?;
        Ok(select(&snapshot, filter))
    }

    fn count(&self, filter: &InstallmentFilter) -> StoreResult<usize> {
        let snapshot = self.read()?;
        let matched = snapshot.installments.iter().filter(|i| filter.matches(i)).count();
        Ok(filter.limit.map_or(matched, |limit| matched.min(limit)))
    }

    fn bulk_update(
        &self,
        filter: &InstallmentFilter,
        patch: &InstallmentPatch,
    ) -> StoreResult<usize> {
        self.transact(|snapshot| apply_patch(snapshot, filter, patch), |_| Ok(()))
    }

    fn insert(&self, installment: Installment) -> StoreResult<InstallmentId> {
        self.transact(|snapshot| insert_into(snapshot, installment), |_| Ok(()))
    }
}

impl AccountDirectory for MemoryLedgerStore {
    fn display_name(&self, account_id: Uuid) -> StoreResult<Option<String>> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .find(|account| account.id() == account_id)
            .map(|account| account.name().to_string()))
    }
}

pub(crate) fn select(snapshot: &LedgerSnapshot, filter: &InstallmentFilter) -> Vec<Installment> {
    let mut rows: Vec<Installment> = snapshot
        .installments
        .iter()
        .filter(|installment| filter.matches(installment))
        .cloned()
        .collect();
    filter.arrange(&mut rows);
    rows
}

pub(crate) fn apply_patch(
    snapshot: &mut LedgerSnapshot,
    filter: &InstallmentFilter,
    patch: &InstallmentPatch,
) -> usize {
    let mut matched: Vec<&mut Installment> = snapshot
        .installments
        .iter_mut()
        .filter(|installment| filter.matches(installment))
        .collect();
    if let Some(limit) = filter.limit {
        matched.truncate(limit);
    }
    for installment in matched.iter_mut() {
        patch.apply(installment);
    }
    debug!(updated = matched.len(), "bulk update applied");
    matched.len()
}

pub(crate) fn insert_into(snapshot: &mut LedgerSnapshot, mut installment: Installment) -> InstallmentId {
    let id = snapshot.next_id.max(1);
    installment.id = id;
    snapshot.next_id = id + 1;
    snapshot.installments.push(installment);
    id
}

pub(crate) fn add_account_to(snapshot: &mut LedgerSnapshot, account: Account) -> Uuid {
    let id = account.id;
    match snapshot.accounts.iter_mut().find(|existing| existing.id == id) {
        Some(existing) => *existing = account,
        None => snapshot.accounts.push(account),
    }
    id
}
