//! Generation of recurring installments anchored on an account's first due date.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{Displayable, Installment, ItemCategory};
use crate::errors::{LedgerError, Result};
use crate::ledger::{next_due_date, InstallmentFilter, InstallmentOrder};
use crate::storage::InstallmentStore;

pub struct ScheduleService {
    store: Arc<dyn InstallmentStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn InstallmentStore>) -> Self {
        Self { store }
    }

    /// Appends the installment following the latest one of `account_id` in `category`.
    ///
    /// The due date keeps the day-of-month of the series' first installment, and the
    /// amount, track and payment method are carried over from the latest one.
    pub fn append_next(&self, account_id: Uuid, category: ItemCategory) -> Result<Installment> {
        if category == ItemCategory::AdHoc {
            return Err(LedgerError::Validation(
                "ad-hoc items do not recur".into(),
            ));
        }
        let series = self.store.query(
            &InstallmentFilter::new()
                .account(account_id)
                .category(category)
                .ordered_by(InstallmentOrder::SequenceThenDueDate),
        )?;
        let (Some(first), Some(latest)) = (series.first(), series.last()) else {
            return Err(LedgerError::NotFound(format!(
                "no {category} installments for account {account_id}"
            )));
        };

        let due_date = next_due_date(first.due_date, latest.due_date)?;
        let mut next = Installment::new(
            account_id,
            latest.sequence_number + 1,
            latest.amount,
            due_date,
            category,
        );
        next.track = latest.track.clone();
        next.payment_method = latest.payment_method.clone();
        next.id = self.store.insert(next.clone())?;
        info!(%account_id, installment = %next.display_label(), "installment scheduled");
        Ok(next)
    }
}
