//! Cycle lifecycle: assignment, editing and closing of installment groups.
//!
//! Cross-call isolation is not provided. Two concurrent edits of the same account
//! resolve as last-write-wins; callers needing exactly-once semantics must serialize
//! mutations per account themselves.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CycleConfig;
use crate::core::gate::{AllowAll, CycleAction, MutationGate};
use crate::domain::{CycleRange, CycleView, InstallmentId};
use crate::errors::{LedgerError, Result};
use crate::ledger::{CycleMatch, InstallmentFilter, InstallmentPatch};
use crate::storage::InstallmentStore;

pub struct CycleService {
    store: Arc<dyn InstallmentStore>,
    gate: Arc<dyn MutationGate>,
    policy: CycleConfig,
}

impl CycleService {
    pub fn new(store: Arc<dyn InstallmentStore>) -> Self {
        Self {
            store,
            gate: Arc::new(AllowAll),
            policy: CycleConfig::default(),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn MutationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_policy(mut self, policy: CycleConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Finds the account's cycle with the given archived flag, if any.
    ///
    /// When several tuples exist, the one holding the lowest installment id wins.
    pub fn detect_cycle(&self, account_id: Uuid, archived: bool) -> Result<Option<CycleView>> {
        let probe = cycle_members(account_id, archived)
            .cycle(CycleMatch::Assigned)
            .limit(1);
        let Some(range) = self
            .store
            .query(&probe)?
            .into_iter()
            .next()
            .and_then(|installment| installment.cycle)
        else {
            return Ok(None);
        };
        let count = self
            .store
            .count(&cycle_members(account_id, archived).in_range(range))?;
        Ok(Some(CycleView {
            range,
            archived,
            count,
        }))
    }

    /// Every distinct cycle tuple of the account, ordered by start date.
    pub fn list_cycles(&self, account_id: Uuid, archived: bool) -> Result<Vec<CycleView>> {
        let members = self
            .store
            .query(&cycle_members(account_id, archived).cycle(CycleMatch::Assigned))?;
        let mut counts: BTreeMap<CycleRange, usize> = BTreeMap::new();
        for range in members.iter().filter_map(|installment| installment.cycle) {
            *counts.entry(range).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(range, count)| CycleView {
                range,
                archived,
                count,
            })
            .collect())
    }

    /// Places the selected installments into the cycle `range` and returns how many
    /// were updated.
    ///
    /// Every id must exist, belong to `account_id`, be unassigned, unarchived and not
    /// ad-hoc; the first violation is reported before anything is written.
    pub fn assign_cycle(
        &self,
        account_id: Uuid,
        installment_ids: &[InstallmentId],
        range: CycleRange,
    ) -> Result<usize> {
        self.authorize(CycleAction::Assign, account_id)?;
        range.ensure_ordered()?;
        if installment_ids.is_empty() {
            return Err(LedgerError::Validation(
                "no installments selected for the cycle".into(),
            ));
        }

        let ids: BTreeSet<InstallmentId> = installment_ids.iter().copied().collect();
        self.ensure_assignable(account_id, &ids)?;
        if self.policy.reject_overlapping_cycles {
            self.ensure_no_overlap(account_id, range, None)?;
        }

        let selection = cycle_members(account_id, false)
            .cycle(CycleMatch::Unassigned)
            .ids(ids.iter().copied());
        let updated = self
            .store
            .bulk_update(&selection, &InstallmentPatch::set_cycle(range))?;
        if updated != ids.len() {
            warn!(
                %account_id,
                requested = ids.len(),
                updated,
                "installments changed between validation and assignment"
            );
        }
        info!(%account_id, %range, updated, "cycle assigned");
        Ok(updated)
    }

    /// Moves every unarchived member of `old_range` to `new_range`.
    pub fn edit_cycle(
        &self,
        account_id: Uuid,
        old_range: CycleRange,
        new_range: CycleRange,
    ) -> Result<usize> {
        self.authorize(CycleAction::Edit, account_id)?;
        new_range.ensure_ordered()?;

        let group = cycle_members(account_id, false).in_range(old_range);
        if self.store.count(&group)? == 0 {
            debug!(%account_id, %old_range, "edit requested for missing cycle");
            return Err(LedgerError::NotFound(format!(
                "no active cycle {old_range} for account {account_id}"
            )));
        }
        if self.policy.reject_overlapping_cycles {
            self.ensure_no_overlap(account_id, new_range, Some(old_range))?;
        }

        let updated = self
            .store
            .bulk_update(&group, &InstallmentPatch::set_cycle(new_range))?;
        info!(%account_id, %old_range, %new_range, updated, "cycle edited");
        Ok(updated)
    }

    /// Archives every unarchived member of `range`. Closing an already archived
    /// cycle matches nothing and returns 0.
    pub fn close_cycle(&self, account_id: Uuid, range: CycleRange) -> Result<usize> {
        self.authorize(CycleAction::Close, account_id)?;
        let group = cycle_members(account_id, false).in_range(range);
        let archived = self.store.bulk_update(&group, &InstallmentPatch::archive())?;
        info!(%account_id, %range, archived, "cycle closed");
        Ok(archived)
    }

    fn authorize(&self, action: CycleAction, account_id: Uuid) -> Result<()> {
        self.gate.authorize(action, account_id).map_err(|reason| {
            debug!(%account_id, %action, %reason, "mutation rejected by gate");
            LedgerError::Unauthorized(reason)
        })
    }

    fn ensure_assignable(&self, account_id: Uuid, ids: &BTreeSet<InstallmentId>) -> Result<()> {
        let found: BTreeMap<InstallmentId, _> = self
            .store
            .query(&InstallmentFilter::new().ids(ids.iter().copied()))?
            .into_iter()
            .map(|installment| (installment.id, installment))
            .collect();

        for id in ids {
            let reason = match found.get(id) {
                None => Some("does not exist".to_string()),
                Some(item) if item.account_id != account_id => {
                    Some(format!("belongs to account {}", item.account_id))
                }
                Some(item) if item.archived => Some("is archived".to_string()),
                Some(item) if !item.is_cycle_eligible() => {
                    Some("is an ad-hoc item and cannot join a cycle".to_string())
                }
                Some(item) => item
                    .cycle
                    .map(|existing| format!("already belongs to cycle {existing}")),
            };
            if let Some(reason) = reason {
                debug!(%account_id, installment = id, %reason, "assignment rejected");
                return Err(LedgerError::Validation(format!("installment {id} {reason}")));
            }
        }
        Ok(())
    }

    fn ensure_no_overlap(
        &self,
        account_id: Uuid,
        range: CycleRange,
        replacing: Option<CycleRange>,
    ) -> Result<()> {
        let clash = self
            .list_cycles(account_id, false)?
            .into_iter()
            .filter(|view| Some(view.range) != replacing && view.range != range)
            .find(|view| view.range.overlaps(&range));
        match clash {
            Some(view) => Err(LedgerError::Validation(format!(
                "cycle {range} overlaps existing cycle {} for account {account_id}",
                view.range
            ))),
            None => Ok(()),
        }
    }
}

/// Non-ad-hoc installments of one account with the given archived flag.
fn cycle_members(account_id: Uuid, archived: bool) -> InstallmentFilter {
    InstallmentFilter::new()
        .account(account_id)
        .archived(archived)
        .cycle_eligible()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::ReadOnly;
    use crate::domain::{Installment, ItemCategory};
    use crate::storage::MemoryLedgerStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded(count: u32) -> (Arc<MemoryLedgerStore>, Uuid, Vec<InstallmentId>) {
        let store = Arc::new(MemoryLedgerStore::new());
        let account = Uuid::new_v4();
        let ids = (1..=count)
            .map(|seq| {
                store
                    .insert(Installment::new(
                        account,
                        seq,
                        200.0,
                        date(2024, seq, 10),
                        ItemCategory::Plan,
                    ))
                    .unwrap()
            })
            .collect();
        (store, account, ids)
    }

    fn semester() -> CycleRange {
        CycleRange::new(date(2024, 1, 1), date(2024, 6, 30))
    }

    #[test]
    fn assign_rejects_unordered_range_and_empty_selection() {
        let (store, account, ids) = seeded(1);
        let service = CycleService::new(store);
        let reversed = CycleRange::new(date(2024, 6, 30), date(2024, 1, 1));
        assert!(matches!(
            service.assign_cycle(account, &ids, reversed),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            service.assign_cycle(account, &[], semester()),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn assign_names_the_offending_installment() {
        let (store, account, mut ids) = seeded(2);
        let ad_hoc = store
            .insert(Installment::new(account, 1, 15.0, date(2024, 2, 1), ItemCategory::AdHoc))
            .unwrap();
        ids.push(ad_hoc);
        let service = CycleService::new(store.clone());

        let err = service
            .assign_cycle(account, &ids, semester())
            .expect_err("ad-hoc item must be rejected");
        let message = err.to_string();
        assert!(message.contains(&format!("installment {ad_hoc}")), "unexpected: {message}");
        assert_eq!(store.count(&InstallmentFilter::new().cycle(CycleMatch::Assigned)).unwrap(), 0);
    }

    #[test]
    fn assign_rejects_foreign_and_missing_installments() {
        let (store, account, ids) = seeded(1);
        let service = CycleService::new(store);
        let other = Uuid::new_v4();
        assert!(matches!(
            service.assign_cycle(other, &ids, semester()),
            Err(LedgerError::Validation(message)) if message.contains("belongs to account")
        ));
        assert!(matches!(
            service.assign_cycle(account, &[999], semester()),
            Err(LedgerError::Validation(message)) if message.contains("999 does not exist")
        ));
    }

    #[test]
    fn list_cycles_groups_by_tuple() {
        let (store, account, ids) = seeded(4);
        let service = CycleService::new(store);
        let spring = semester();
        let autumn = CycleRange::new(date(2024, 7, 1), date(2024, 12, 31));
        service.assign_cycle(account, &ids[..3], spring).unwrap();
        service.assign_cycle(account, &ids[3..], autumn).unwrap();

        let cycles = service.list_cycles(account, false).unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!((cycles[0].range, cycles[0].count), (spring, 3));
        assert_eq!((cycles[1].range, cycles[1].count), (autumn, 1));
    }

    #[test]
    fn overlap_policy_blocks_intersecting_ranges() {
        let (store, account, ids) = seeded(2);
        let service = CycleService::new(store).with_policy(CycleConfig {
            reject_overlapping_cycles: true,
        });
        service.assign_cycle(account, &ids[..1], semester()).unwrap();
        let overlapping = CycleRange::new(date(2024, 6, 1), date(2024, 12, 31));
        assert!(matches!(
            service.assign_cycle(account, &ids[1..], overlapping),
            Err(LedgerError::Validation(message)) if message.contains("overlaps")
        ));
        // Re-timing the only cycle may overlap its own previous range.
        assert_eq!(service.edit_cycle(account, semester(), overlapping).unwrap(), 1);
    }

    #[test]
    fn read_only_gate_blocks_mutations() {
        let (store, account, ids) = seeded(1);
        let service = CycleService::new(store.clone()).with_gate(Arc::new(ReadOnly));
        let err = service
            .assign_cycle(account, &ids, semester())
            .expect_err("gate must reject");
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        assert!(err.state_unchanged());
        assert!(store.get(ids[0]).unwrap().unwrap().cycle.is_none());
    }
}
