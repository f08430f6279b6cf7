//! Billing installments and the enums that classify them.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::domain::cycle::CycleRange;

/// Ordered, store-assigned installment identifier.
pub type InstallmentId = u64;

/// A single billing line item owned by an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Installment {
    pub id: InstallmentId,
    pub account_id: Uuid,
    pub sequence_number: u32,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub item_category: ItemCategory,
    #[serde(default)]
    pub cycle: Option<CycleRange>,
    #[serde(default)]
    pub archived: bool,
    /// Language or course track the installment bills for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Installment {
    /// Creates a pending, unassigned, non-archived installment. The store replaces `id`
    /// on insert.
    pub fn new(
        account_id: Uuid,
        sequence_number: u32,
        amount: f64,
        due_date: NaiveDate,
        item_category: ItemCategory,
    ) -> Self {
        Self {
            id: 0,
            account_id,
            sequence_number,
            amount,
            due_date,
            payment_date: None,
            payment_status: PaymentStatus::Pending,
            item_category,
            cycle: None,
            archived: false,
            track: None,
            payment_method: None,
            notes: None,
        }
    }

    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    pub fn mark_paid(&mut self, payment_date: NaiveDate) {
        self.payment_status = PaymentStatus::Paid;
        self.payment_date = Some(payment_date);
    }

    pub fn is_cycle_eligible(&self) -> bool {
        self.item_category != ItemCategory::AdHoc
    }

    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        DisplayStatus::derive(self.payment_status, self.due_date, today)
    }
}

impl Identifiable for Installment {
    type Id = InstallmentId;

    fn id(&self) -> InstallmentId {
        self.id
    }
}

impl Amounted for Installment {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Installment {
    fn display_label(&self) -> String {
        format!(
            "#{} {} {:.2} due {} [{}]",
            self.sequence_number, self.item_category, self.amount, self.due_date, self.payment_status
        )
    }
}

/// Persisted payment state. `Overdue` is never stored; see [`DisplayStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Cancelled,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    /// Accepts the English labels and the Portuguese ones found in migrated exports.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "paid" | "pago" => Ok(PaymentStatus::Paid),
            "pending" | "pendente" | "overdue" | "atrasado" => Ok(PaymentStatus::Pending),
            "cancelled" | "canceled" | "cancelado" => Ok(PaymentStatus::Cancelled),
            other => Err(format!("unknown payment status `{other}`")),
        }
    }
}

/// Status shown to readers: stored status plus the derived `Overdue`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DisplayStatus {
    Paid,
    Pending,
    Overdue,
    Cancelled,
}

impl DisplayStatus {
    pub fn derive(status: PaymentStatus, due_date: NaiveDate, today: NaiveDate) -> Self {
        match status {
            PaymentStatus::Paid => DisplayStatus::Paid,
            PaymentStatus::Cancelled => DisplayStatus::Cancelled,
            PaymentStatus::Pending if due_date < today => DisplayStatus::Overdue,
            PaymentStatus::Pending => DisplayStatus::Pending,
        }
    }
}

/// What an installment bills for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemCategory {
    Plan,
    Material,
    Enrollment,
    Cancellation,
    AdHoc,
    Other,
}

impl ItemCategory {
    pub fn label(self) -> &'static str {
        match self {
            ItemCategory::Plan => "Plan",
            ItemCategory::Material => "Material",
            ItemCategory::Enrollment => "Enrollment",
            ItemCategory::Cancellation => "Cancellation",
            ItemCategory::AdHoc => "Ad hoc",
            ItemCategory::Other => "Other",
        }
    }

    /// Maps the free-text categories of migrated rows; anything unrecognised is `Other`.
    pub fn from_legacy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "plan" | "plano" | "mensalidade" | "tuition" => ItemCategory::Plan,
            "material" | "materials" | "livro" => ItemCategory::Material,
            "enrollment" | "matricula" | "matrícula" => ItemCategory::Enrollment,
            "cancellation" | "cancelamento" | "rescisao" | "rescisão" => {
                ItemCategory::Cancellation
            }
            "adhoc" | "ad hoc" | "ad-hoc" | "avulso" => ItemCategory::AdHoc,
            _ => ItemCategory::Other,
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which partition a reconciled record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourcePartition {
    Active,
    LegacyMigrated,
}
