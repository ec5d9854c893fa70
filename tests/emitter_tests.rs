// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use feeledger::emit::{
    build_allocations, build_balance_records, build_ledger_event, build_receipt, receipt_uuid,
    ReceiptNumberAllocator,
};
use feeledger::ledger::reconstruct_enrollment_events;
use feeledger::loaders::ComponentMap;
use feeledger::models::{
    BalanceSnapshot, ComponentRef, EventType, FeeComponent, LegacyReceipt, PaymentMethod,
    ReceiptStatus,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

fn components() -> ComponentMap {
    let refs = FeeComponent::ALL
        .into_iter()
        .map(|c| ComponentRef {
            component: c,
            target_id: format!("FC-{}", c.code()),
            label: format!("{} Fee", c.code()),
        })
        .collect();
    ComponentMap::new(refs).unwrap()
}

fn receipt(id: &str) -> LegacyReceipt {
    LegacyReceipt {
        id: id.to_string(),
        student_id: "10384".to_string(),
        enrol_code: "AIMT(H)/10384/2023".to_string(),
        fee_date: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
        receipt_no: Some("1001".to_string()),
        reg_fee: Decimal::from(500),
        sec_fee: Decimal::ZERO,
        tut_fee: Decimal::from(45000),
        other_fee: Decimal::ZERO,
        pre_bal: Decimal::ZERO,
        rebate: Decimal::ZERO,
        is_cancelled: false,
        payment_method: "qr phonepay".to_string(),
        reference_number: "TXN-9".to_string(),
        created_at: Some("2023-07-01 10:00:00".to_string()),
    }
}

#[test]
fn allocator_keeps_valid_unused_legacy_numbers() {
    let mut alloc = ReceiptNumberAllocator::new();
    assert_eq!(alloc.assign(Some("1001")), "1001");
    assert_eq!(alloc.assign(Some("1002")), "1002");
}

#[test]
fn allocator_replaces_duplicate_zero_and_blank_numbers() {
    let mut alloc = ReceiptNumberAllocator::new();
    assert_eq!(alloc.assign(Some("1001")), "1001");
    assert_eq!(alloc.assign(Some("1001")), "MIG-000001");
    assert_eq!(alloc.assign(Some("0")), "MIG-000002");
    assert_eq!(alloc.assign(Some("  ")), "MIG-000003");
    assert_eq!(alloc.assign(None), "MIG-000004");
}

#[test]
fn allocator_skips_synthetic_numbers_already_taken() {
    let mut alloc = ReceiptNumberAllocator::new();
    assert_eq!(alloc.assign(Some("MIG-000001")), "MIG-000001");
    assert_eq!(alloc.assign(None), "MIG-000002");
}

#[test]
fn allocator_never_repeats_across_a_run() {
    let mut alloc = ReceiptNumberAllocator::new();
    let mut seen = HashSet::new();
    for legacy in [Some("7"), Some("7"), Some("0"), None, Some("7"), Some("8")] {
        assert!(seen.insert(alloc.assign(legacy)));
    }
}

#[test]
fn receipt_row_mirrors_paid_into_total_and_keeps_audit_fields() {
    let r = build_receipt(&receipt("101"), "ENR-1", "1001".to_string());
    assert_eq!(r.total_amount, Decimal::from(45500));
    assert_eq!(r.paid_amount, Decimal::from(45500));
    assert_eq!(r.balance_amount, Decimal::ZERO);
    assert_eq!(r.status, ReceiptStatus::Active);
    assert_eq!(r.payment_method, PaymentMethod::QrPhonepe);
    assert_eq!(r.academic_year, "2023-24");
    assert_eq!(r.legacy_tut_fee, Decimal::from(45000));
    assert_eq!(r.legacy_receipt_id, "101");
    assert_eq!(r.comments, "Converted from legacy receipt - ACTIVE");
    // Minting is deterministic: the same legacy receipt maps to the same id.
    assert_eq!(r.id, receipt_uuid(&receipt("101")));
}

#[test]
fn cancelled_receipt_row_is_emitted_with_cancelled_status() {
    let mut legacy = receipt("102");
    legacy.is_cancelled = true;
    legacy.reg_fee = Decimal::ZERO;
    legacy.tut_fee = Decimal::ZERO;
    let r = build_receipt(&legacy, "ENR-1", "MIG-000001".to_string());
    assert_eq!(r.status, ReceiptStatus::Cancelled);
    assert_eq!(r.total_amount, Decimal::ZERO);
    assert_eq!(r.comments, "Converted from legacy receipt - CANCELLED");
}

#[test]
fn allocations_cover_every_positive_component_and_link_to_payment_events() {
    let legacy = receipt("101");
    let snapshots: HashMap<String, BalanceSnapshot> = HashMap::new();
    let components = components();

    let events = reconstruct_enrollment_events(std::slice::from_ref(&legacy), &snapshots);
    let bound: Vec<_> = events
        .iter()
        .map(|e| build_ledger_event(e, &legacy, "ENR-1", &components))
        .collect();
    let allocations = build_allocations(&legacy, "ENR-1", &components);

    assert_eq!(allocations.len(), 2); // reg and tut only
    for a in &allocations {
        assert_eq!(a.receipt_id, receipt_uuid(&legacy));
        let event = bound
            .iter()
            .find(|e| e.id == a.ledger_event_id)
            .expect("allocation links to an emitted event");
        assert_eq!(event.event_type, EventType::PaymentReceived);
        assert_eq!(event.fee_component_id, a.fee_component_id);
        assert_eq!(event.amount, -a.allocated_amount);
    }
}

#[test]
fn charge_events_carry_no_receipt_reference() {
    let legacy = receipt("101");
    let components = components();
    let events = reconstruct_enrollment_events(std::slice::from_ref(&legacy), &HashMap::new());
    for e in events {
        let bound = build_ledger_event(&e, &legacy, "ENR-1", &components);
        if bound.event_type == EventType::ChargeCreated {
            assert!(bound.receipt_id.is_none());
            assert!(bound.description.starts_with("Initial charge"));
        } else {
            assert_eq!(bound.receipt_id, Some(receipt_uuid(&legacy)));
        }
        assert_eq!(bound.legacy_receipt_id, "101");
    }
}

#[test]
fn balance_records_reconstruct_charges_from_snapshots() {
    let legacy = receipt("101");
    let components = components();
    let snapshot = BalanceSnapshot {
        receipt_id: "101".to_string(),
        tut_balance: Decimal::from(45000),
        // A balance can remain on a component this receipt paid nothing for.
        sec_balance: Decimal::from(2000),
        ..Default::default()
    };

    let records = build_balance_records(&legacy, Some(&snapshot), "ENR-1", &components);

    assert_eq!(records.len(), 3); // reg (paid), sec (charged), tut (both)
    let tut = records
        .iter()
        .find(|r| r.fee_component_id == "FC-TUITION")
        .unwrap();
    assert_eq!(tut.charge_amount, Decimal::from(90000));
    assert_eq!(tut.paid_amount, Decimal::from(45000));
    assert_eq!(tut.balance_amount, Decimal::from(45000));

    let sec = records
        .iter()
        .find(|r| r.fee_component_id == "FC-SECURITY")
        .unwrap();
    assert_eq!(sec.charge_amount, Decimal::from(2000));
    assert_eq!(sec.paid_amount, Decimal::ZERO);
}

#[test]
fn zero_activity_components_get_no_balance_record() {
    let mut legacy = receipt("101");
    legacy.reg_fee = Decimal::ZERO;
    legacy.tut_fee = Decimal::ZERO;
    let records = build_balance_records(&legacy, None, "ENR-1", &components());
    assert!(records.is_empty());
}
