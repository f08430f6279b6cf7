//! Cycles are emergent groupings: every non-ad-hoc installment of an account sharing
//! the same `(range, archived)` tuple belongs to the same cycle.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Inclusive billing date range shared by the installments of one cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Rejects ranges whose start is not strictly before their end.
    pub fn ensure_ordered(&self) -> Result<()> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(LedgerError::Validation(format!(
                "cycle start {} must be before end {}",
                self.start, self.end
            )))
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &CycleRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for CycleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Derived lifecycle state of an installment's cycle membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CycleState {
    Unassigned,
    /// Assigned, not archived, and today is before the range starts.
    Upcoming,
    Active,
    Expired,
    Archived,
}

impl CycleState {
    pub fn derive(cycle: Option<CycleRange>, archived: bool, today: NaiveDate) -> Self {
        if archived {
            return CycleState::Archived;
        }
        match cycle {
            None => CycleState::Unassigned,
            Some(range) if range.contains(today) => CycleState::Active,
            Some(range) if today < range.start => CycleState::Upcoming,
            Some(_) => CycleState::Expired,
        }
    }
}

/// Summary of one cycle tuple as seen by callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleView {
    pub range: CycleRange,
    pub archived: bool,
    pub count: usize,
}

impl CycleView {
    pub fn state(&self, today: NaiveDate) -> CycleState {
        CycleState::derive(Some(self.range), self.archived, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_must_be_strictly_ordered() {
        assert!(CycleRange::new(date(2024, 1, 1), date(2024, 6, 30))
            .ensure_ordered()
            .is_ok());
        let err = CycleRange::new(date(2024, 6, 30), date(2024, 6, 30))
            .ensure_ordered()
            .expect_err("equal bounds are rejected");
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn state_follows_dates_until_archived() {
        let range = CycleRange::new(date(2024, 1, 1), date(2024, 6, 30));
        assert_eq!(CycleState::derive(None, false, date(2024, 3, 1)), CycleState::Unassigned);
        assert_eq!(CycleState::derive(Some(range), false, date(2023, 12, 31)), CycleState::Upcoming);
        assert_eq!(CycleState::derive(Some(range), false, date(2024, 1, 1)), CycleState::Active);
        assert_eq!(CycleState::derive(Some(range), false, date(2024, 6, 30)), CycleState::Active);
        assert_eq!(CycleState::derive(Some(range), false, date(2024, 7, 1)), CycleState::Expired);
        assert_eq!(CycleState::derive(Some(range), true, date(2024, 3, 1)), CycleState::Archived);
    }

    #[test]
    fn overlap_includes_shared_endpoint() {
        let first = CycleRange::new(date(2024, 1, 1), date(2024, 6, 30));
        let touching = CycleRange::new(date(2024, 6, 30), date(2024, 12, 31));
        let disjoint = CycleRange::new(date(2024, 7, 1), date(2024, 12, 31));
        assert!(first.overlaps(&touching));
        assert!(!first.overlaps(&disjoint));
    }
}
