use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::common::Amounted;

/// Read-only expense entry from the external expense feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub amount: f64,
    pub category: String,
    pub status: ExpenseStatus,
    pub date: NaiveDate,
}

impl Amounted for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpenseStatus {
    Paid,
    Pending,
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseStatus::Paid => f.write_str("Paid"),
            ExpenseStatus::Pending => f.write_str("Pending"),
        }
    }
}

impl FromStr for ExpenseStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "paid" | "pago" => Ok(ExpenseStatus::Paid),
            "pending" | "pendente" => Ok(ExpenseStatus::Pending),
            other => Err(format!("unknown expense status `{other}`")),
        }
    }
}
