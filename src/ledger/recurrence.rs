//! Calendar-safe month arithmetic used to project installment due dates.
//!
//! Every projection is taken from the original billing anchor rather than from the
//! previous due date, so a plan anchored on the 31st returns to the 31st after a
//! short month instead of drifting to the 28th/29th.

use chrono::{Datelike, NaiveDate};

use crate::errors::{LedgerError, Result};

/// Whole calendar months from `from` to `to`, ignoring the day of month.
///
/// Fails with [`LedgerError::InvalidRange`] when `to` precedes `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Result<i32> {
    if to < from {
        return Err(LedgerError::InvalidRange(format!(
            "{to} is before {from}; month difference is undefined"
        )));
    }
    Ok((to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32))
}

/// Moves `date` by `months` calendar months, clamping the day to the last valid day of
/// the resulting month.
pub fn add_months_safe(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).map_err(|_| out_of_range(date, months))?;
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| out_of_range(date, months))
}

/// Due date of the installment that follows `current`, anchored on `first`.
pub fn next_due_date(first: NaiveDate, current: NaiveDate) -> Result<NaiveDate> {
    let elapsed = months_between(first, current)?;
    add_months_safe(first, elapsed + 1)
}

/// The first `count` due dates of a monthly plan anchored on `first`.
pub fn project_schedule(first: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    let mut current = first;
    for idx in 0..count {
        if idx > 0 {
            current = next_due_date(first, current)?;
        }
        dates.push(current);
    }
    Ok(dates)
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .ok_or_else(|| LedgerError::InvalidRange(format!("{year}-{month:02} is not a valid month")))
}

fn out_of_range(date: NaiveDate, months: i32) -> LedgerError {
    LedgerError::InvalidRange(format!("{date} shifted by {months} month(s) is out of range"))
}
