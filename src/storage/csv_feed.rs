//! Feeds backed by CSV exports of the migrated billing sheet and the expense book.

use std::{io::Read, path::Path};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ExpenseFeed, LegacySource, StoreResult};
use crate::domain::{Expense, ExpenseStatus, LegacyRow};

/// Serves a legacy CSV export page by page, ordered by due date descending.
///
/// Expected headers: `name,amount,due_date,payment_date,payment_status,category,track,payment_method,notes`.
#[derive(Debug, Clone, Default)]
pub struct CsvLegacySource {
    rows: Vec<LegacyRow>,
}

impl CsvLegacySource {
    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        let source = Self::from_csv(reader)?;
        info!(path = %path.as_ref().display(), rows = source.rows.len(), "legacy export loaded");
        Ok(source)
    }

    pub fn from_reader<R: Read>(reader: R) -> StoreResult<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    pub fn from_rows(mut rows: Vec<LegacyRow>) -> Self {
        rows.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> StoreResult<Self> {
        let rows = reader
            .deserialize::<LegacyRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows))
    }
}

#[async_trait]
impl LegacySource for CsvLegacySource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> StoreResult<Vec<LegacyRow>> {
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }
}

#[derive(Debug, Deserialize)]
struct ExpenseCsvRow {
    amount: f64,
    #[serde(default)]
    category: String,
    status: String,
    date: NaiveDate,
}

/// Expense feed read from a CSV export with headers `amount,category,status,date`.
///
/// Rows with an unrecognised status are skipped with a warning.
#[derive(Debug, Clone, Default)]
pub struct CsvExpenseFeed {
    expenses: Vec<Expense>,
}

impl CsvExpenseFeed {
    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_csv(csv::Reader::from_path(path.as_ref())?)
    }

    pub fn from_reader<R: Read>(reader: R) -> StoreResult<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Self { expenses }
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> StoreResult<Self> {
        let mut expenses = Vec::new();
        for (line, row) in reader.deserialize::<ExpenseCsvRow>().enumerate() {
            let row = row?;
            match row.status.parse::<ExpenseStatus>() {
                Ok(status) => expenses.push(Expense {
                    amount: row.amount,
                    category: row.category,
                    status,
                    date: row.date,
                }),
                Err(reason) => warn!(line = line + 2, %reason, "skipping expense row"),
            }
        }
        Ok(Self { expenses })
    }
}

#[async_trait]
impl ExpenseFeed for CsvExpenseFeed {
    async fn expenses(&self) -> StoreResult<Vec<Expense>> {
        Ok(self.expenses.clone())
    }
}
