//! Report shapes handed to presentation layers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::record::UnifiedRecord;

/// An unpaid record falling due inside the look-ahead horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingDue {
    pub record: UnifiedRecord,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    /// Running sum over the kept months, oldest first.
    pub cumulative: f64,
}

/// Grouping key for category revenue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RevenueDimension {
    #[default]
    ItemCategory,
    Track,
    PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRevenue {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BucketTotal {
    pub amount: f64,
    pub count: usize,
}

impl BucketTotal {
    pub(crate) fn add(&mut self, amount: f64) {
        self.amount += amount;
        self.count += 1;
    }
}

/// Aging buckets; every record lands in exactly one of the four.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AgingTotals {
    pub received: BucketTotal,
    pub pending: BucketTotal,
    pub overdue: BucketTotal,
    pub cancelled: BucketTotal,
    pub total_all: BucketTotal,
    pub total_receivable: f64,
    pub percent_collected: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub balance: f64,
}

/// Every report computed over one reconciled record set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialOverview {
    pub generated_on: NaiveDate,
    pub record_count: usize,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub category_revenue: Vec<CategoryRevenue>,
    pub upcoming_dues: Vec<UpcomingDue>,
    pub aging: AgingTotals,
    pub balance: Balance,
    /// Non-fatal issues, such as legacy paging that stopped early.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
