//! Composable predicates and patches evaluated by installment stores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CycleRange, Installment, InstallmentId, ItemCategory};

/// How an installment's cycle bounds must look to match a filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CycleMatch {
    #[default]
    Any,
    Unassigned,
    Assigned,
    Exactly(CycleRange),
}

impl CycleMatch {
    fn matches(&self, cycle: Option<CycleRange>) -> bool {
        match self {
            CycleMatch::Any => true,
            CycleMatch::Unassigned => cycle.is_none(),
            CycleMatch::Assigned => cycle.is_some(),
            CycleMatch::Exactly(range) => cycle == Some(*range),
        }
    }
}

/// Result ordering for [`InstallmentFilter`] queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InstallmentOrder {
    #[default]
    Id,
    SequenceThenDueDate,
}

/// Conjunction of optional constraints; an empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstallmentFilter {
    pub account_id: Option<Uuid>,
    pub archived: Option<bool>,
    pub cycle: CycleMatch,
    pub exclude_ad_hoc: bool,
    pub category: Option<ItemCategory>,
    pub ids: Option<BTreeSet<InstallmentId>>,
    pub order: InstallmentOrder,
    pub limit: Option<usize>,
}

impl InstallmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn cycle(mut self, cycle: CycleMatch) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn in_range(self, range: CycleRange) -> Self {
        self.cycle(CycleMatch::Exactly(range))
    }

    /// Drops ad-hoc installments, which never belong to a cycle.
    pub fn cycle_eligible(mut self) -> Self {
        self.exclude_ad_hoc = true;
        self
    }

    pub fn category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = InstallmentId>,
    {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn ordered_by(mut self, order: InstallmentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, installment: &Installment) -> bool {
        if self
            .account_id
            .is_some_and(|account| account != installment.account_id)
        {
            return false;
        }
        if self.archived.is_some_and(|flag| flag != installment.archived) {
            return false;
        }
        if !self.cycle.matches(installment.cycle) {
            return false;
        }
        if self.exclude_ad_hoc && !installment.is_cycle_eligible() {
            return false;
        }
        if self
            .category
            .is_some_and(|category| category != installment.item_category)
        {
            return false;
        }
        match &self.ids {
            Some(ids) => ids.contains(&installment.id),
            None => true,
        }
    }

    /// Sorts and truncates already-matched rows according to `order` and `limit`.
    pub fn arrange(&self, rows: &mut Vec<Installment>) {
        match self.order {
            InstallmentOrder::Id => rows.sort_by_key(|row| row.id),
            InstallmentOrder::SequenceThenDueDate => {
                rows.sort_by_key(|row| (row.sequence_number, row.due_date, row.id))
            }
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
    }
}

/// Field overwrites applied by a bulk update.
///
/// Archiving is one-way: a patch can set the flag but never clear it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct InstallmentPatch {
    cycle: Option<CycleRange>,
    archive: bool,
}

impl InstallmentPatch {
    pub fn set_cycle(range: CycleRange) -> Self {
        Self {
            cycle: Some(range),
            archive: false,
        }
    }

    pub fn archive() -> Self {
        Self {
            cycle: None,
            archive: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cycle.is_none() && !self.archive
    }

    pub fn apply(&self, installment: &mut Installment) {
        if let Some(range) = self.cycle {
            installment.cycle = Some(range);
        }
        if self.archive {
            installment.archived = true;
        }
    }
}
