//! Merges the active ledger with the legacy/migrated partition and the expense feed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ReportingConfig;
use crate::core::services::report_service::ReportService;
use crate::core::time::{Clock, SystemClock};
use crate::domain::{
    compare_display_names, FinancialOverview, ItemCategory, LegacyRow, PaymentStatus,
    SourcePartition, UnifiedRecord,
};
use crate::errors::{PartialAggregationError, PartialCause, Result};
use crate::ledger::InstallmentFilter;
use crate::storage::{AccountDirectory, ExpenseFeed, InstallmentStore, LegacySource};

/// Constraints applied to both partitions when loading records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub account_id: Option<Uuid>,
    pub category: Option<ItemCategory>,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(account_id: Uuid) -> Self {
        Self {
            account_id: Some(account_id),
            category: None,
        }
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Unified records plus the warning raised when legacy paging stopped early.
#[derive(Debug)]
pub struct ReconciledRecords {
    pub records: Vec<UnifiedRecord>,
    pub partial: Option<PartialAggregationError>,
}

impl ReconciledRecords {
    pub fn is_complete(&self) -> bool {
        self.partial.is_none()
    }
}

pub struct ReconciliationService {
    ledger: Arc<dyn InstallmentStore>,
    directory: Arc<dyn AccountDirectory>,
    legacy: Arc<dyn LegacySource>,
    expenses: Arc<dyn ExpenseFeed>,
    config: ReportingConfig,
    clock: Arc<dyn Clock>,
}

impl ReconciliationService {
    pub fn new(
        ledger: Arc<dyn InstallmentStore>,
        directory: Arc<dyn AccountDirectory>,
        legacy: Arc<dyn LegacySource>,
        expenses: Arc<dyn ExpenseFeed>,
    ) -> Self {
        Self {
            ledger,
            directory,
            legacy,
            expenses,
            config: ReportingConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_config(mut self, config: ReportingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Loads unarchived active installments and every legacy row matching `query`,
    /// sorted by due date descending and then owner name.
    ///
    /// Ledger failures abort the call. Legacy paging failures, timeouts and
    /// cancellation keep the rows fetched so far and are reported in `partial`.
    pub async fn load_unified_records(
        &self,
        query: &RecordQuery,
        cancel: &CancellationToken,
    ) -> Result<ReconciledRecords> {
        let mut records = self.load_active(query)?;
        let active_count = records.len();

        let (legacy_rows, partial) = self.fetch_legacy(cancel).await;
        let owner_filter = match query.account_id {
            Some(account_id) => self.directory.display_name(account_id)?,
            None => None,
        };
        records.extend(
            legacy_rows
                .into_iter()
                .map(normalize_legacy_row)
                .filter(|record| legacy_matches(record, query, owner_filter.as_deref())),
        );

        records.sort_by(|a, b| {
            b.due_date
                .cmp(&a.due_date)
                .then_with(|| compare_display_names(&a.owner_name, &b.owner_name))
        });
        info!(
            active = active_count,
            legacy = records.len() - active_count,
            complete = partial.is_none(),
            "records reconciled"
        );
        Ok(ReconciledRecords { records, partial })
    }

    /// Pulls legacy pages until one comes back short. Stops early, keeping what was
    /// accumulated, when a page fails, exceeds the page timeout, or `cancel` fires
    /// between pages.
    pub async fn fetch_legacy(
        &self,
        cancel: &CancellationToken,
    ) -> (Vec<LegacyRow>, Option<PartialAggregationError>) {
        let page_size = self.config.legacy_page_size.max(1);
        let timeout = self.config.page_timeout();
        let mut rows = Vec::new();
        let mut pages_fetched = 0;

        let cause = loop {
            if cancel.is_cancelled() {
                break Some(PartialCause::Cancelled);
            }
            let fetch = self.legacy.fetch_page(rows.len(), page_size);
            let page = match tokio::time::timeout(timeout, fetch).await {
                Ok(Ok(page)) => page,
                Ok(Err(err)) => break Some(PartialCause::FetchFailed(err)),
                Err(_) => break Some(PartialCause::TimedOut(timeout)),
            };
            pages_fetched += 1;
            let short_page = page.len() < page_size;
            debug!(page = pages_fetched, rows = page.len(), "legacy page fetched");
            rows.extend(page);
            if short_page {
                break None;
            }
        };

        let partial = cause.map(|cause| PartialAggregationError {
            pages_fetched,
            rows_kept: rows.len(),
            cause,
        });
        if let Some(partial) = &partial {
            warn!(error = %partial, "continuing with partial legacy data");
        }
        (rows, partial)
    }

    /// Builds every report over the reconciled records for today's date.
    pub async fn overview(
        &self,
        query: &RecordQuery,
        cancel: &CancellationToken,
    ) -> Result<FinancialOverview> {
        let reconciled = self.load_unified_records(query, cancel).await?;
        let expenses = self.expenses.expenses().await?;
        let today = self.clock.today();
        let mut overview =
            ReportService::overview(&reconciled.records, &expenses, today, &self.config);
        if let Some(partial) = reconciled.partial {
            overview.warnings.push(partial.to_string());
        }
        Ok(overview)
    }

    fn load_active(&self, query: &RecordQuery) -> Result<Vec<UnifiedRecord>> {
        let mut filter = InstallmentFilter::new().archived(false);
        if let Some(account_id) = query.account_id {
            filter = filter.account(account_id);
        }
        if let Some(category) = query.category {
            filter = filter.category(category);
        }
        let installments = self.ledger.query(&filter)?;

        let owners: Vec<Uuid> = installments.iter().map(|i| i.account_id).collect();
        let names = self.directory.display_names(&owners)?;
        Ok(installments
            .iter()
            .map(|installment| {
                let owner = names.get(&installment.account_id).cloned().unwrap_or_else(|| {
                    warn!(account_id = %installment.account_id, "installment owner has no display name");
                    installment.account_id.to_string()
                });
                UnifiedRecord::from_active(installment, owner)
            })
            .collect())
    }
}

/// Maps a legacy row into the unified shape. Legacy rows carry no account or sequence,
/// so `account_id` stays empty and the sequence number is 1.
fn normalize_legacy_row(row: LegacyRow) -> UnifiedRecord {
    let payment_status = row.payment_status.parse().unwrap_or_else(|reason| {
        warn!(name = %row.name, %reason, "treating legacy row as pending");
        PaymentStatus::Pending
    });
    let category = row.category.trim();
    UnifiedRecord {
        id: None,
        account_id: None,
        owner_name: row.name.trim().to_string(),
        sequence_number: 1,
        amount: row.amount,
        due_date: row.due_date,
        payment_date: row.payment_date,
        payment_status,
        item_category: ItemCategory::from_legacy(category),
        category_label: if category.is_empty() {
            ItemCategory::Other.label().to_string()
        } else {
            category.to_string()
        },
        track: row.track,
        payment_method: row.payment_method,
        notes: row.notes,
        source: SourcePartition::LegacyMigrated,
    }
}

/// Legacy rows have no account key; an account query matches them by owner name only.
fn legacy_matches(record: &UnifiedRecord, query: &RecordQuery, owner: Option<&str>) -> bool {
    if query
        .category
        .is_some_and(|category| category != record.item_category)
    {
        return false;
    }
    match (query.account_id, owner) {
        (None, _) => true,
        (Some(_), Some(name)) => record.owner_name.trim() == name.trim(),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(name: &str, status: &str, category: &str) -> LegacyRow {
        LegacyRow {
            name: format!(" {name} "),
            amount: 90.0,
            due_date: NaiveDate::from_ymd_opt(2022, 11, 10).unwrap(),
            payment_date: None,
            payment_status: status.into(),
            category: category.into(),
            track: None,
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn legacy_rows_normalize_into_unified_shape() {
        let record = normalize_legacy_row(row("Ana", "Pago", "Mensalidade"));
        assert_eq!(record.owner_name, "Ana");
        assert_eq!(record.account_id, None);
        assert_eq!(record.sequence_number, 1);
        assert_eq!(record.payment_status, PaymentStatus::Paid);
        assert_eq!(record.item_category, ItemCategory::Plan);
        assert_eq!(record.category_label, "Mensalidade");
        assert_eq!(record.source, SourcePartition::LegacyMigrated);
    }

    #[test]
    fn unknown_legacy_status_falls_back_to_pending() {
        let record = normalize_legacy_row(row("Ana", "???", ""));
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.category_label, "Other");
    }

    #[test]
    fn account_queries_match_legacy_rows_by_name() {
        let record = normalize_legacy_row(row("Ana", "Pago", "Material"));
        let query = RecordQuery::for_account(Uuid::new_v4());
        assert!(legacy_matches(&record, &query, Some("Ana")));
        assert!(!legacy_matches(&record, &query, Some("Bruno")));
        assert!(!legacy_matches(&record, &query, None));
        assert!(!legacy_matches(
            &record,
            &RecordQuery::all().with_category(ItemCategory::Plan),
            None
        ));
    }
}
