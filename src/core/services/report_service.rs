//! Pure aggregations over reconciled records.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::config::ReportingConfig;
use crate::domain::{
    compare_display_names, AgingTotals, Amounted, Balance, CategoryRevenue, Expense, ExpenseStatus,
    FinancialOverview, MonthlyRevenue, PaymentStatus, RevenueDimension, UnifiedRecord, UpcomingDue,
};

pub struct ReportService;

impl ReportService {
    /// Unpaid records due between today and `horizon_days` from now, soonest first.
    pub fn upcoming_dues(
        records: &[UnifiedRecord],
        today: NaiveDate,
        horizon_days: i64,
    ) -> Vec<UpcomingDue> {
        let mut dues: Vec<UpcomingDue> = records
            .iter()
            .filter(|record| !record.is_paid())
            .filter_map(|record| {
                let days_remaining = (record.due_date - today).num_days();
                (0..=horizon_days)
                    .contains(&days_remaining)
                    .then(|| UpcomingDue {
                        record: record.clone(),
                        days_remaining,
                    })
            })
            .collect();
        dues.sort_by(|a, b| {
            a.record
                .due_date
                .cmp(&b.record.due_date)
                .then_with(|| compare_display_names(&a.record.owner_name, &b.record.owner_name))
        });
        dues
    }

    /// Paid revenue per payment month, keeping the `months` most recent months with a
    /// running total across them.
    pub fn monthly_revenue(records: &[UnifiedRecord], months: usize) -> Vec<MonthlyRevenue> {
        let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for record in records.iter().filter(|record| record.is_paid()) {
            if let Some(paid_on) = record.payment_date {
                *by_month.entry((paid_on.year(), paid_on.month())).or_default() += record.amount;
            }
        }

        let skip = by_month.len().saturating_sub(months);
        let mut cumulative = 0.0;
        by_month
            .into_iter()
            .skip(skip)
            .map(|((year, month), total)| {
                cumulative += total;
                MonthlyRevenue {
                    year,
                    month,
                    total,
                    cumulative,
                }
            })
            .collect()
    }

    /// Paid revenue grouped by `dimension`, largest first, without zero-sum groups.
    pub fn category_revenue(
        records: &[UnifiedRecord],
        dimension: RevenueDimension,
    ) -> Vec<CategoryRevenue> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for record in records.iter().filter(|record| record.is_paid()) {
            *totals.entry(dimension_label(record, dimension)).or_default() += record.amount;
        }
        let mut groups: Vec<CategoryRevenue> = totals
            .into_iter()
            .filter(|(_, total)| total.abs() > f64::EPSILON)
            .map(|(label, total)| CategoryRevenue { label, total })
            .collect();
        groups.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| compare_display_names(&a.label, &b.label))
        });
        groups
    }

    pub fn balance(records: &[UnifiedRecord], expenses: &[Expense]) -> Balance {
        let total_revenue: f64 = records
            .iter()
            .filter(|record| record.is_paid())
            .map(Amounted::amount)
            .sum();
        let total_expenses: f64 = expenses
            .iter()
            .filter(|expense| expense.status == ExpenseStatus::Paid)
            .map(Amounted::amount)
            .sum();
        Balance {
            total_revenue,
            total_expenses,
            balance: total_revenue - total_expenses,
        }
    }

    pub fn aging_totals(records: &[UnifiedRecord], today: NaiveDate) -> AgingTotals {
        let mut aging = AgingTotals::default();
        for record in records {
            let bucket = match record.payment_status {
                PaymentStatus::Paid => &mut aging.received,
                PaymentStatus::Cancelled => &mut aging.cancelled,
                PaymentStatus::Pending if record.due_date < today => &mut aging.overdue,
                PaymentStatus::Pending => &mut aging.pending,
            };
            bucket.add(record.amount);
            aging.total_all.add(record.amount);
        }
        aging.total_receivable = aging.pending.amount + aging.overdue.amount;
        aging.percent_collected = if aging.total_all.amount == 0.0 {
            0.0
        } else {
            aging.received.amount / aging.total_all.amount * 100.0
        };
        aging
    }

    pub fn overview(
        records: &[UnifiedRecord],
        expenses: &[Expense],
        today: NaiveDate,
        config: &ReportingConfig,
    ) -> FinancialOverview {
        FinancialOverview {
            generated_on: today,
            record_count: records.len(),
            monthly_revenue: Self::monthly_revenue(records, config.revenue_months),
            category_revenue: Self::category_revenue(records, RevenueDimension::ItemCategory),
            upcoming_dues: Self::upcoming_dues(records, today, config.upcoming_horizon_days),
            aging: Self::aging_totals(records, today),
            balance: Self::balance(records, expenses),
            warnings: Vec::new(),
        }
    }
}

fn dimension_label(record: &UnifiedRecord, dimension: RevenueDimension) -> String {
    let label = match dimension {
        RevenueDimension::ItemCategory => Some(record.category_label.as_str()),
        RevenueDimension::Track => record.track.as_deref(),
        RevenueDimension::PaymentMethod => record.payment_method.as_deref(),
    };
    match label.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "Unspecified".to_string(),
    }
}
