// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger reconstruction. The legacy system never recorded charges as
//! discrete events, only per-receipt balance snapshots taken after each
//! payment. To make the target ledger event-sourced (current balance =
//! fold of signed amounts), an opening charge is inferred per component
//! from that component's first positive-payment receipt.

use crate::models::{BalanceSnapshot, EventType, FeeComponent, LegacyReceipt};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// One reconstructed posting, not yet bound to target identifiers.
/// `receipt_index` points into the sorted receipt slice the event came from.
#[derive(Debug, Clone)]
pub struct ReconstructedEvent {
    pub receipt_index: usize,
    pub component: FeeComponent,
    pub kind: EventType,
    pub amount: Decimal,
    pub running_balance: Decimal,
}

impl ReconstructedEvent {
    pub fn is_opening_charge(&self) -> bool {
        self.kind == EventType::ChargeCreated
    }
}

fn snapshot_balance(
    snapshots: &HashMap<String, BalanceSnapshot>,
    receipt: &LegacyReceipt,
    component: FeeComponent,
) -> Decimal {
    snapshots
        .get(&receipt.id)
        .map(|s| s.balance(component))
        .unwrap_or(Decimal::ZERO)
}

/// The balance a component stood at just before a receipt was applied.
/// Exact, because the receipt's own payment is the only event between the
/// "before" and the snapshot taken after it.
fn balance_before(
    snapshots: &HashMap<String, BalanceSnapshot>,
    receipt: &LegacyReceipt,
    component: FeeComponent,
) -> Decimal {
    snapshot_balance(snapshots, receipt, component) + receipt.amount(component)
}

/// The historical-inference rule: a component's first positive-payment
/// receipt implies a charge predating every observed receipt whenever its
/// computed balance-before is positive. Isolated here so the heuristic can
/// be validated or replaced if better source data surfaces.
fn opening_charge(
    snapshots: &HashMap<String, BalanceSnapshot>,
    first_receipt: &LegacyReceipt,
    component: FeeComponent,
) -> Option<Decimal> {
    let before = balance_before(snapshots, first_receipt, component);
    (before > Decimal::ZERO).then_some(before)
}

/// Sort one enrollment's receipts ascending by payment date, stable so
/// same-date receipts keep their input order.
pub fn sort_receipts(receipts: &mut [LegacyReceipt]) {
    receipts.sort_by_key(|r| r.fee_date);
}

/// Reconstruct the event history for one enrollment from its date-sorted
/// receipts and their balance snapshots.
///
/// Each component is treated independently: an inferred CHARGE_CREATED
/// opens the component's history when its first positive payment did not
/// settle it from zero, then every positive payment becomes a
/// PAYMENT_RECEIVED (or PAYMENT_CANCELLED for cancelled receipts) whose
/// running balance is the legacy snapshot taken as-is. A component with no
/// positive payment across the whole history produces no events at all.
pub fn reconstruct_enrollment_events(
    sorted_receipts: &[LegacyReceipt],
    snapshots: &HashMap<String, BalanceSnapshot>,
) -> Vec<ReconstructedEvent> {
    let mut events = Vec::new();
    let mut charge_emitted: HashMap<FeeComponent, bool> = HashMap::new();

    for (index, receipt) in sorted_receipts.iter().enumerate() {
        for component in FeeComponent::ALL {
            let payment = receipt.amount(component);
            if payment <= Decimal::ZERO {
                continue;
            }

            let seen = charge_emitted.entry(component).or_insert(false);
            if !*seen {
                *seen = true;
                if let Some(amount) = opening_charge(snapshots, receipt, component) {
                    events.push(ReconstructedEvent {
                        receipt_index: index,
                        component,
                        kind: EventType::ChargeCreated,
                        amount,
                        running_balance: amount,
                    });
                }
            }

            let kind = if receipt.is_cancelled {
                EventType::PaymentCancelled
            } else {
                EventType::PaymentReceived
            };
            events.push(ReconstructedEvent {
                receipt_index: index,
                component,
                kind,
                amount: -payment,
                running_balance: snapshot_balance(snapshots, receipt, component),
            });
        }
    }

    events
}
