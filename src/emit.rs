// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ident::stable_id;
use crate::ledger::ReconstructedEvent;
use crate::loaders::ComponentMap;
use crate::models::{
    Allocation, BalanceRecord, BalanceSnapshot, EventType, FeeComponent, LedgerEvent,
    LegacyReceipt, PaymentMethod, Receipt, ReceiptStatus,
};
use crate::utils::academic_year;
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

/// Hands out unique receipt numbers for the whole run. A legacy number is
/// kept when present, non-zero and not already taken; otherwise a synthetic
/// `MIG-%06d` number comes off the counter. Owned state passed by `&mut`
/// through the emission stage, in strict legacy input order.
#[derive(Debug)]
pub struct ReceiptNumberAllocator {
    used: HashSet<String>,
    counter: u64,
}

impl Default for ReceiptNumberAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptNumberAllocator {
    pub fn new() -> ReceiptNumberAllocator {
        ReceiptNumberAllocator {
            used: HashSet::new(),
            counter: 1,
        }
    }

    pub fn assign(&mut self, legacy_number: Option<&str>) -> String {
        if let Some(raw) = legacy_number {
            let clean = raw.trim();
            if !clean.is_empty() && clean != "0" && self.used.insert(clean.to_string()) {
                return clean.to_string();
            }
        }
        loop {
            let candidate = format!("MIG-{:06}", self.counter);
            self.counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

pub fn receipt_uuid(legacy_receipt: &LegacyReceipt) -> Uuid {
    stable_id("receipt", &[&legacy_receipt.id])
}

fn event_uuid(legacy_receipt: &LegacyReceipt, component: FeeComponent, kind: EventType) -> Uuid {
    stable_id("event", &[&legacy_receipt.id, component.code(), kind.as_str()])
}

fn created_at(receipt: &LegacyReceipt) -> String {
    receipt
        .created_at
        .clone()
        .unwrap_or_else(|| receipt.fee_date.to_string())
}

fn legacy_number(receipt: &LegacyReceipt) -> &str {
    receipt.receipt_no.as_deref().unwrap_or("")
}

/// Bind one reconstructed posting to target identifiers. Inferred opening
/// charges carry no receipt reference; payments point at the receipt that
/// produced them.
pub fn build_ledger_event(
    event: &ReconstructedEvent,
    receipt: &LegacyReceipt,
    enrollment_id: &str,
    components: &ComponentMap,
) -> LedgerEvent {
    let component = components.get(event.component);
    let description = match event.kind {
        EventType::ChargeCreated => format!("Initial charge - {}", component.label),
        EventType::PaymentReceived => format!(
            "Payment for {} - Receipt {}",
            component.label,
            legacy_number(receipt)
        ),
        EventType::PaymentCancelled => format!(
            "Cancelled payment for {} - Receipt {}",
            component.label,
            legacy_number(receipt)
        ),
    };
    LedgerEvent {
        id: event_uuid(receipt, event.component, event.kind),
        event_type: event.kind,
        event_date: receipt.fee_date,
        enrollment_id: enrollment_id.to_string(),
        academic_year: academic_year(receipt.fee_date),
        fee_component_id: component.target_id.clone(),
        amount: event.amount,
        running_balance: event.running_balance,
        receipt_id: (!event.is_opening_charge()).then(|| receipt_uuid(receipt)),
        description,
        created_at: created_at(receipt),
        legacy_receipt_id: receipt.id.clone(),
    }
}

/// One Receipt row per resolved legacy receipt, cancelled and zero-amount
/// ones included. Paid mirrors total: the legacy model records full payment
/// per receipt.
pub fn build_receipt(
    receipt: &LegacyReceipt,
    enrollment_id: &str,
    receipt_number: String,
) -> Receipt {
    let total = receipt.total_amount();
    let status = if receipt.is_cancelled {
        ReceiptStatus::Cancelled
    } else {
        ReceiptStatus::Active
    };
    Receipt {
        id: receipt_uuid(receipt),
        receipt_number,
        receipt_date: receipt.fee_date,
        enrollment_id: enrollment_id.to_string(),
        academic_year: academic_year(receipt.fee_date),
        total_amount: total,
        paid_amount: total,
        balance_amount: Decimal::ZERO,
        payment_method: PaymentMethod::from_legacy(&receipt.payment_method),
        payment_reference: receipt.reference_number.clone(),
        legacy_reg_fee: receipt.reg_fee,
        legacy_sec_fee: receipt.sec_fee,
        legacy_tut_fee: receipt.tut_fee,
        legacy_other_fee: receipt.other_fee,
        legacy_pre_bal: receipt.pre_bal,
        legacy_rebate: receipt.rebate,
        status,
        comments: format!("Converted from legacy receipt - {}", status.as_str()),
        created_at: created_at(receipt),
        legacy_receipt_id: receipt.id.clone(),
    }
}

/// One allocation per positive component amount, referencing the payment
/// event the reconstructor produced for this (receipt, component).
pub fn build_allocations(
    receipt: &LegacyReceipt,
    enrollment_id: &str,
    components: &ComponentMap,
) -> Vec<Allocation> {
    let kind = if receipt.is_cancelled {
        EventType::PaymentCancelled
    } else {
        EventType::PaymentReceived
    };
    FeeComponent::ALL
        .into_iter()
        .filter(|&c| receipt.amount(c) > Decimal::ZERO)
        .map(|c| Allocation {
            id: stable_id("allocation", &[&receipt.id, c.code()]),
            receipt_id: receipt_uuid(receipt),
            ledger_event_id: event_uuid(receipt, c, kind),
            fee_component_id: components.get(c).target_id.clone(),
            allocated_amount: receipt.amount(c),
            enrollment_id: enrollment_id.to_string(),
            academic_year: academic_year(receipt.fee_date),
            receipt_date: receipt.fee_date,
            created_at: created_at(receipt),
            legacy_receipt_id: receipt.id.clone(),
        })
        .collect()
}

/// One balance record per component that was either charged or paid on
/// this receipt: charge = balance-after + paid, balance = balance-after
/// straight from the legacy snapshot.
pub fn build_balance_records(
    receipt: &LegacyReceipt,
    snapshot: Option<&BalanceSnapshot>,
    enrollment_id: &str,
    components: &ComponentMap,
) -> Vec<BalanceRecord> {
    FeeComponent::ALL
        .into_iter()
        .filter_map(|c| {
            let paid = receipt.amount(c);
            let balance_after = snapshot.map(|s| s.balance(c)).unwrap_or(Decimal::ZERO);
            let charge = balance_after + paid;
            if charge <= Decimal::ZERO && paid <= Decimal::ZERO {
                return None;
            }
            Some(BalanceRecord {
                id: stable_id("balance", &[&receipt.id, c.code()]),
                receipt_id: receipt_uuid(receipt),
                fee_component_id: components.get(c).target_id.clone(),
                charge_amount: charge,
                paid_amount: paid,
                balance_amount: balance_after,
                enrollment_id: enrollment_id.to_string(),
                academic_year: academic_year(receipt.fee_date),
                receipt_date: receipt.fee_date,
                created_at: created_at(receipt),
                legacy_receipt_id: receipt.id.clone(),
            })
        })
        .collect()
}
