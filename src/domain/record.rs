//! Shapes shared by both ledger partitions once they are reconciled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Amounted;
use crate::domain::installment::{
    DisplayStatus, Installment, InstallmentId, ItemCategory, PaymentStatus, SourcePartition,
};

/// Raw row exposed by the legacy/migrated partition.
///
/// Identity is the free-text `name`; there is no foreign key to an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyRow {
    pub name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub payment_status: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One billing line in the unified shape consumed by reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedRecord {
    pub id: Option<InstallmentId>,
    pub account_id: Option<Uuid>,
    pub owner_name: String,
    pub sequence_number: u32,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub item_category: ItemCategory,
    pub category_label: String,
    pub track: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub source: SourcePartition,
}

impl UnifiedRecord {
    pub fn from_active(installment: &Installment, owner_name: impl Into<String>) -> Self {
        Self {
            id: Some(installment.id),
            account_id: Some(installment.account_id),
            owner_name: owner_name.into(),
            sequence_number: installment.sequence_number,
            amount: installment.amount,
            due_date: installment.due_date,
            payment_date: installment.payment_date,
            payment_status: installment.payment_status,
            item_category: installment.item_category,
            category_label: installment.item_category.label().to_string(),
            track: installment.track.clone(),
            payment_method: installment.payment_method.clone(),
            notes: installment.notes.clone(),
            source: SourcePartition::Active,
        }
    }

    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        DisplayStatus::derive(self.payment_status, self.due_date, today)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

impl Amounted for UnifiedRecord {
    fn amount(&self) -> f64 {
        self.amount
    }
}
