mod common;

use std::sync::Arc;

use common::{date, temp_dir};
use tuition_ledger::{
    core::services::ScheduleService,
    domain::{Account, Installment, ItemCategory},
    ledger::{add_months_safe, months_between, next_due_date, project_schedule},
    storage::{InstallmentStore, JsonLedgerStore},
    LedgerError,
};

#[test]
fn month_end_anchors_clamp_without_drifting() {
    let first = date(2024, 1, 31);
    let projected = project_schedule(first, 4).unwrap();
    assert_eq!(
        projected,
        vec![
            date(2024, 1, 31),
            date(2024, 2, 29),
            date(2024, 3, 31),
            date(2024, 4, 30),
        ]
    );
    assert_eq!(next_due_date(first, date(2024, 2, 29)).unwrap(), date(2024, 3, 31));
    assert_eq!(add_months_safe(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
}

#[test]
fn month_arithmetic_crosses_year_boundaries() {
    assert_eq!(add_months_safe(date(2024, 11, 15), 3).unwrap(), date(2025, 2, 15));
    assert_eq!(add_months_safe(date(2024, 1, 15), -2).unwrap(), date(2023, 11, 15));
    assert_eq!(months_between(date(2023, 12, 31), date(2024, 1, 1)).unwrap(), 1);
    assert!(matches!(
        months_between(date(2024, 5, 1), date(2024, 4, 1)),
        Err(LedgerError::InvalidRange(_))
    ));
}

#[test]
fn appended_installments_persist_with_the_series_anchor() {
    let path = temp_dir().join("ledger.json");
    let store = Arc::new(JsonLedgerStore::open(&path).unwrap());
    let account_id = store.add_account(Account::new("Carla Dias")).unwrap();
    let mut first = Installment::new(account_id, 1, 250.0, date(2024, 1, 31), ItemCategory::Plan)
        .with_track("English B1");
    first.payment_method = Some("Pix".into());
    store.insert(first).unwrap();

    let service = ScheduleService::new(store.clone());
    let second = service.append_next(account_id, ItemCategory::Plan).unwrap();
    let third = service.append_next(account_id, ItemCategory::Plan).unwrap();
    assert_eq!(second.due_date, date(2024, 2, 29));
    assert_eq!(third.due_date, date(2024, 3, 31));
    assert_eq!(third.sequence_number, 3);
    assert_eq!(third.track.as_deref(), Some("English B1"));
    assert_eq!(third.payment_method.as_deref(), Some("Pix"));

    let reopened = JsonLedgerStore::open(&path).unwrap();
    let stored = reopened.get(third.id).unwrap().expect("persisted installment");
    assert_eq!(stored, third);
}

#[test]
fn append_requires_an_existing_recurring_series() {
    let path = temp_dir().join("ledger.json");
    let store = Arc::new(JsonLedgerStore::open(path).unwrap());
    let account_id = store.add_account(Account::new("Davi")).unwrap();
    let service = ScheduleService::new(store);

    assert!(matches!(
        service.append_next(account_id, ItemCategory::Material),
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        service.append_next(account_id, ItemCategory::AdHoc),
        Err(LedgerError::Validation(_))
    ));
}
