mod common;

use std::sync::Arc;

use common::{date, seeded_store};
use tuition_ledger::{
    config::CycleConfig,
    core::{services::CycleService, ReadOnly},
    domain::{Account, CycleRange, CycleState, Installment, ItemCategory},
    ledger::InstallmentFilter,
    storage::InstallmentStore,
    LedgerError,
};

fn school_year() -> CycleRange {
    CycleRange::new(date(2024, 2, 1), date(2024, 12, 20))
}

#[test]
fn assign_detect_and_close_round_trip() {
    let (store, account_id, ids) = seeded_store(3);
    let service = CycleService::new(store.clone());

    let assigned = service
        .assign_cycle(account_id, &ids, school_year())
        .expect("assign cycle");
    assert_eq!(assigned, 3);

    let active = service
        .detect_cycle(account_id, false)
        .expect("detect")
        .expect("active cycle present");
    assert_eq!(active.range, school_year());
    assert_eq!(active.count, 3);
    assert_eq!(active.state(date(2024, 6, 1)), CycleState::Active);
    assert_eq!(active.state(date(2025, 1, 5)), CycleState::Expired);

    let closed = service
        .close_cycle(account_id, school_year())
        .expect("close cycle");
    assert_eq!(closed, 3);
    assert!(service.detect_cycle(account_id, false).unwrap().is_none());

    let archived = service
        .detect_cycle(account_id, true)
        .unwrap()
        .expect("archived cycle present");
    assert_eq!(archived.count, 3);
    assert_eq!(archived.state(date(2024, 6, 1)), CycleState::Archived);
}

#[test]
fn closing_twice_is_a_no_op() {
    let (store, account_id, ids) = seeded_store(2);
    let service = CycleService::new(store.clone());
    service.assign_cycle(account_id, &ids, school_year()).unwrap();

    assert_eq!(service.close_cycle(account_id, school_year()).unwrap(), 2);
    let before = store.snapshot().unwrap();
    assert_eq!(service.close_cycle(account_id, school_year()).unwrap(), 0);
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn edit_moves_the_whole_group() {
    let (store, account_id, ids) = seeded_store(3);
    let service = CycleService::new(store.clone());
    service.assign_cycle(account_id, &ids, school_year()).unwrap();

    let extended = CycleRange::new(date(2024, 2, 1), date(2025, 1, 31));
    assert_eq!(
        service
            .edit_cycle(account_id, school_year(), extended)
            .unwrap(),
        3
    );

    let cycles = service.list_cycles(account_id, false).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].range, extended);
    assert!(store
        .query(&InstallmentFilter::new())
        .unwrap()
        .iter()
        .all(|installment| installment.cycle == Some(extended)));
}

#[test]
fn editing_a_missing_cycle_leaves_state_unchanged() {
    let (store, account_id, ids) = seeded_store(2);
    let service = CycleService::new(store.clone());
    service.assign_cycle(account_id, &ids, school_year()).unwrap();
    let before = store.snapshot().unwrap();

    let missing = CycleRange::new(date(2023, 2, 1), date(2023, 12, 20));
    let err = service
        .edit_cycle(account_id, missing, school_year())
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {err:?}");
    assert!(err.state_unchanged());
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn editing_to_the_same_range_changes_nothing() {
    let (store, account_id, ids) = seeded_store(2);
    let service = CycleService::new(store.clone());
    service.assign_cycle(account_id, &ids, school_year()).unwrap();
    let assigned = store.snapshot().unwrap();

    let edited = service
        .edit_cycle(account_id, school_year(), school_year())
        .unwrap();
    assert_eq!(edited, 2);
    assert_eq!(store.snapshot().unwrap(), assigned);
}

#[test]
fn closed_cycles_cannot_be_edited() {
    let (store, account_id, ids) = seeded_store(2);
    let service = CycleService::new(store.clone());
    service.assign_cycle(account_id, &ids, school_year()).unwrap();
    service.close_cycle(account_id, school_year()).unwrap();
    let closed = store.snapshot().unwrap();

    let extended = CycleRange::new(date(2024, 2, 1), date(2025, 1, 31));
    let err = service
        .edit_cycle(account_id, school_year(), extended)
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {err:?}");
    assert_eq!(store.snapshot().unwrap(), closed);
}

#[test]
fn assignment_is_all_or_nothing() {
    let (store, account_id, mut ids) = seeded_store(2);
    let ad_hoc = store
        .insert(Installment::new(
            account_id,
            1,
            35.0,
            date(2024, 3, 3),
            ItemCategory::AdHoc,
        ))
        .unwrap();
    ids.push(ad_hoc);
    let service = CycleService::new(store.clone());
    let before = store.snapshot().unwrap();

    let err = service
        .assign_cycle(account_id, &ids, school_year())
        .unwrap_err();
    match err {
        LedgerError::Validation(message) => {
            assert!(message.contains(&ad_hoc.to_string()), "got {message}")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn foreign_and_already_assigned_installments_are_rejected() {
    let (store, account_id, ids) = seeded_store(2);
    let other = store.add_account(Account::new("Bruno Lima")).unwrap();
    let service = CycleService::new(store.clone());

    let err = service
        .assign_cycle(other, &ids, school_year())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    service.assign_cycle(account_id, &ids[..1], school_year()).unwrap();
    let err = service
        .assign_cycle(account_id, &ids, school_year())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn inverted_and_empty_requests_fail_validation() {
    let (store, account_id, ids) = seeded_store(1);
    let service = CycleService::new(store);
    let inverted = CycleRange::new(date(2024, 12, 1), date(2024, 2, 1));

    assert!(matches!(
        service.assign_cycle(account_id, &ids, inverted),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        service.assign_cycle(account_id, &[], school_year()),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn overlap_policy_rejects_intersecting_cycles() {
    let (store, account_id, ids) = seeded_store(4);
    let service = CycleService::new(store.clone()).with_policy(CycleConfig {
        reject_overlapping_cycles: true,
    });
    service
        .assign_cycle(account_id, &ids[..2], school_year())
        .unwrap();

    let overlapping = CycleRange::new(date(2024, 12, 20), date(2025, 6, 30));
    let err = service
        .assign_cycle(account_id, &ids[2..], overlapping)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");

    let next_year = CycleRange::new(date(2025, 1, 6), date(2025, 12, 19));
    assert_eq!(
        service
            .assign_cycle(account_id, &ids[2..], next_year)
            .unwrap(),
        2
    );
}

#[test]
fn read_only_gate_blocks_every_mutation() {
    let (store, account_id, ids) = seeded_store(2);
    let before = store.snapshot().unwrap();
    let service = CycleService::new(store.clone()).with_gate(Arc::new(ReadOnly));

    assert!(matches!(
        service.assign_cycle(account_id, &ids, school_year()),
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(matches!(
        service.close_cycle(account_id, school_year()),
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(service.detect_cycle(account_id, false).unwrap().is_none());
    assert_eq!(store.snapshot().unwrap(), before);
}
