#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;
use tuition_ledger::{
    domain::{Account, Installment, InstallmentId, ItemCategory, LegacyRow},
    storage::{InstallmentStore, MemoryLedgerStore},
};
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Returns a fresh directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// In-memory store seeded with one account and `count` monthly plan installments
/// starting on 2024-02-10.
pub fn seeded_store(count: u32) -> (Arc<MemoryLedgerStore>, Uuid, Vec<InstallmentId>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let account_id = store
        .add_account(Account::new("Ana Souza"))
        .expect("add account");
    let ids = (1..=count)
        .map(|seq| {
            let due = date(2024, 1 + seq, 10);
            store
                .insert(Installment::new(account_id, seq, 120.0, due, ItemCategory::Plan))
                .expect("insert installment")
        })
        .collect();
    (store, account_id, ids)
}

pub fn legacy_row(name: &str, amount: f64, due: NaiveDate, status: &str) -> LegacyRow {
    LegacyRow {
        name: name.to_string(),
        amount,
        due_date: due,
        payment_date: (status == "Pago").then_some(due),
        payment_status: status.to_string(),
        category: "Mensalidade".to_string(),
        track: None,
        payment_method: None,
        notes: None,
    }
}
