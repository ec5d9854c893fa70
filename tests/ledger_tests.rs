// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use feeledger::ledger::{reconstruct_enrollment_events, sort_receipts};
use feeledger::models::{BalanceSnapshot, EventType, FeeComponent, LegacyReceipt};
use rust_decimal::Decimal;
use std::collections::HashMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn receipt(id: &str, fee_date: NaiveDate) -> LegacyReceipt {
    LegacyReceipt {
        id: id.to_string(),
        student_id: "10384".to_string(),
        enrol_code: "AIMT(H)/10384/2023".to_string(),
        fee_date,
        receipt_no: Some(id.to_string()),
        reg_fee: Decimal::ZERO,
        sec_fee: Decimal::ZERO,
        tut_fee: Decimal::ZERO,
        other_fee: Decimal::ZERO,
        pre_bal: Decimal::ZERO,
        rebate: Decimal::ZERO,
        is_cancelled: false,
        payment_method: "CASH".to_string(),
        reference_number: String::new(),
        created_at: None,
    }
}

fn tut_snapshot(receipt_id: &str, balance: i64) -> (String, BalanceSnapshot) {
    (
        receipt_id.to_string(),
        BalanceSnapshot {
            receipt_id: receipt_id.to_string(),
            tut_balance: Decimal::from(balance),
            ..Default::default()
        },
    )
}

#[test]
fn two_receipt_tuition_history_gets_opening_charge() {
    // Receipt A pays 45000 leaving 45000 owed; receipt B pays the rest a
    // year later. The opening charge absorbs the pre-payment balance.
    let mut a = receipt("A", date(2023, 7, 1));
    a.tut_fee = Decimal::from(45000);
    let mut b = receipt("B", date(2024, 8, 12));
    b.tut_fee = Decimal::from(45000);
    let snapshots: HashMap<_, _> = [tut_snapshot("A", 45000), tut_snapshot("B", 0)].into();

    let events = reconstruct_enrollment_events(&[a, b], &snapshots);

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind, EventType::ChargeCreated);
    assert_eq!(events[0].component, FeeComponent::Tuition);
    assert_eq!(events[0].amount, Decimal::from(90000));
    assert_eq!(events[0].running_balance, Decimal::from(90000));

    assert_eq!(events[1].kind, EventType::PaymentReceived);
    assert_eq!(events[1].amount, Decimal::from(-45000));
    assert_eq!(events[1].running_balance, Decimal::from(45000));
    assert_eq!(events[1].receipt_index, 0);

    assert_eq!(events[2].kind, EventType::PaymentReceived);
    assert_eq!(events[2].amount, Decimal::from(-45000));
    assert_eq!(events[2].running_balance, Decimal::ZERO);
    assert_eq!(events[2].receipt_index, 1);
}

#[test]
fn replay_of_signed_amounts_reproduces_running_balances() {
    let mut a = receipt("A", date(2023, 7, 1));
    a.tut_fee = Decimal::from(30000);
    a.sec_fee = Decimal::from(2000);
    let mut b = receipt("B", date(2023, 12, 1));
    b.tut_fee = Decimal::from(30000);
    let snapshots: HashMap<_, _> = [
        (
            "A".to_string(),
            BalanceSnapshot {
                receipt_id: "A".to_string(),
                sec_balance: Decimal::ZERO,
                tut_balance: Decimal::from(60000),
                ..Default::default()
            },
        ),
        tut_snapshot("B", 30000),
    ]
    .into();

    let events = reconstruct_enrollment_events(&[a, b], &snapshots);

    let mut running: HashMap<FeeComponent, Decimal> = HashMap::new();
    for event in &events {
        let balance = running.entry(event.component).or_insert(Decimal::ZERO);
        *balance += event.amount;
        assert_eq!(*balance, event.running_balance, "event {:?}", event);
    }
}

#[test]
fn component_with_no_positive_amount_produces_no_events() {
    let mut a = receipt("A", date(2023, 7, 1));
    a.tut_fee = Decimal::from(1000);
    let snapshots: HashMap<_, _> = [tut_snapshot("A", 0)].into();

    let events = reconstruct_enrollment_events(&[a], &snapshots);

    assert!(events.iter().all(|e| e.component == FeeComponent::Tuition));
    assert_eq!(events.len(), 2);
}

#[test]
fn missing_snapshot_reads_as_zero_balance() {
    let mut a = receipt("A", date(2023, 7, 1));
    a.reg_fee = Decimal::from(500);

    let events = reconstruct_enrollment_events(&[a], &HashMap::new());

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventType::ChargeCreated);
    assert_eq!(events[0].amount, Decimal::from(500));
    assert_eq!(events[1].running_balance, Decimal::ZERO);
}

#[test]
fn cancelled_receipt_payments_become_payment_cancelled() {
    let mut a = receipt("A", date(2023, 7, 1));
    a.sec_fee = Decimal::from(1000);
    a.is_cancelled = true;
    let snapshots: HashMap<_, _> = [(
        "A".to_string(),
        BalanceSnapshot {
            receipt_id: "A".to_string(),
            ..Default::default()
        },
    )]
    .into();

    let events = reconstruct_enrollment_events(&[a], &snapshots);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventType::ChargeCreated);
    assert_eq!(events[1].kind, EventType::PaymentCancelled);
    // Running balance still comes straight from the legacy snapshot.
    assert_eq!(events[1].running_balance, Decimal::ZERO);
}

#[test]
fn each_component_charges_from_its_own_first_receipt() {
    // Tuition first appears on receipt A, security only on receipt B; the
    // security charge must come from B's balance, not A's.
    let mut a = receipt("A", date(2023, 7, 1));
    a.tut_fee = Decimal::from(10000);
    let mut b = receipt("B", date(2023, 9, 1));
    b.sec_fee = Decimal::from(2000);
    let snapshots: HashMap<_, _> = [
        tut_snapshot("A", 0),
        (
            "B".to_string(),
            BalanceSnapshot {
                receipt_id: "B".to_string(),
                sec_balance: Decimal::from(3000),
                ..Default::default()
            },
        ),
    ]
    .into();

    let events = reconstruct_enrollment_events(&[a, b], &snapshots);

    let sec_charge = events
        .iter()
        .find(|e| e.component == FeeComponent::Security && e.kind == EventType::ChargeCreated)
        .expect("security charge");
    assert_eq!(sec_charge.amount, Decimal::from(5000));
    assert_eq!(sec_charge.receipt_index, 1);
}

#[test]
fn same_date_receipts_keep_input_order() {
    let mut a = receipt("A", date(2023, 7, 1));
    a.tut_fee = Decimal::from(100);
    let mut b = receipt("B", date(2023, 7, 1));
    b.tut_fee = Decimal::from(200);
    let mut c = receipt("C", date(2023, 6, 1));
    c.tut_fee = Decimal::from(300);

    let mut receipts = vec![a, b, c];
    sort_receipts(&mut receipts);

    let ids: Vec<&str> = receipts.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["C", "A", "B"]);
}
