// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::emit::{
    build_allocations, build_balance_records, build_ledger_event, build_receipt,
    ReceiptNumberAllocator,
};
use crate::ledger::{reconstruct_enrollment_events, sort_receipts};
use crate::loaders::{ComponentMap, Indexes, QualityStats};
use crate::models::{
    Allocation, BalanceRecord, BalanceSnapshot, EventType, LedgerEvent, LegacyReceipt, Receipt,
    ReceiptStatus,
};
use crate::resolve::{resolve_enrollment, Unresolved};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Bound on how many unresolved keys the run summary lists.
pub const UNRESOLVED_SAMPLE: usize = 10;

pub struct MigrationInput {
    pub indexes: Indexes,
    pub components: ComponentMap,
    pub receipts: Vec<LegacyReceipt>,
    pub snapshots: HashMap<String, BalanceSnapshot>,
    pub quality: QualityStats,
}

pub struct MigrationOutput {
    pub receipts: Vec<Receipt>,
    pub events: Vec<LedgerEvent>,
    pub allocations: Vec<Allocation>,
    pub balance_records: Vec<BalanceRecord>,
    pub summary: RunSummary,
}

/// End-of-run aggregates: row counts, breakdowns, and a bounded sample of
/// the keys that could not be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub legacy_receipts: usize,
    pub processed_receipts: usize,
    pub unresolved_receipts: usize,
    pub ledger_events: usize,
    pub allocations: usize,
    pub balance_records: usize,
    pub active_receipts: usize,
    pub cancelled_receipts: usize,
    pub zero_amount_receipts: usize,
    pub charge_events: usize,
    pub payment_received_events: usize,
    pub payment_cancelled_events: usize,
    pub unresolved_enrol_codes: usize,
    pub unresolved_student_ids: usize,
    pub unresolved_enrol_code_sample: Vec<String>,
    pub unresolved_student_id_sample: Vec<String>,
    pub quality: QualityStats,
}

/// Run the whole transform over loaded inputs. Single-threaded by design:
/// the lookup tables are read-only and the receipt-number allocator is the
/// only mutable state, threaded through in strict input order.
pub fn run(input: &MigrationInput) -> MigrationOutput {
    let mut unresolved = Unresolved::default();

    // Resolve each receipt exactly once; the result is cached for both the
    // grouping pass and the per-receipt emission pass.
    let resolutions: Vec<Option<String>> = input
        .receipts
        .iter()
        .map(|r| {
            let resolved = resolve_enrollment(r, &input.indexes);
            if resolved.is_none() {
                unresolved.record(r);
            }
            resolved
        })
        .collect();

    // Group resolved receipts by enrollment, preserving first-seen order so
    // the event table is deterministic.
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, resolution) in resolutions.iter().enumerate() {
        if let Some(enrollment_id) = resolution {
            let at = *group_index.entry(enrollment_id.clone()).or_insert_with(|| {
                groups.push((enrollment_id.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[at].1.push(i);
        }
    }

    // Reconstruct each enrollment's event history from its chronologically
    // sorted receipts.
    let mut events = Vec::new();
    for (enrollment_id, member_indices) in &groups {
        let mut sorted: Vec<LegacyReceipt> = member_indices
            .iter()
            .map(|&i| input.receipts[i].clone())
            .collect();
        sort_receipts(&mut sorted);
        for event in reconstruct_enrollment_events(&sorted, &input.snapshots) {
            let receipt = &sorted[event.receipt_index];
            events.push(build_ledger_event(
                &event,
                receipt,
                enrollment_id,
                &input.components,
            ));
        }
    }

    // Emit receipt, allocation and balance rows over the resolved receipts
    // in original input order; receipt numbers are assigned in that order.
    let mut allocator = ReceiptNumberAllocator::new();
    let mut receipts = Vec::new();
    let mut allocations = Vec::new();
    let mut balance_records = Vec::new();
    for (i, resolution) in resolutions.iter().enumerate() {
        let Some(enrollment_id) = resolution else {
            continue;
        };
        let legacy = &input.receipts[i];
        let number = allocator.assign(legacy.receipt_no.as_deref());
        receipts.push(build_receipt(legacy, enrollment_id, number));
        allocations.extend(build_allocations(legacy, enrollment_id, &input.components));
        balance_records.extend(build_balance_records(
            legacy,
            input.snapshots.get(&legacy.id),
            enrollment_id,
            &input.components,
        ));
    }

    let summary = summarize(input, &receipts, &events, &allocations, &balance_records, &unresolved);

    MigrationOutput {
        receipts,
        events,
        allocations,
        balance_records,
        summary,
    }
}

fn summarize(
    input: &MigrationInput,
    receipts: &[Receipt],
    events: &[LedgerEvent],
    allocations: &[Allocation],
    balance_records: &[BalanceRecord],
    unresolved: &Unresolved,
) -> RunSummary {
    let count_kind = |kind: EventType| events.iter().filter(|e| e.event_type == kind).count();
    RunSummary {
        legacy_receipts: input.receipts.len(),
        processed_receipts: receipts.len(),
        unresolved_receipts: unresolved.count,
        ledger_events: events.len(),
        allocations: allocations.len(),
        balance_records: balance_records.len(),
        active_receipts: receipts
            .iter()
            .filter(|r| r.status == ReceiptStatus::Active)
            .count(),
        cancelled_receipts: receipts
            .iter()
            .filter(|r| r.status == ReceiptStatus::Cancelled)
            .count(),
        zero_amount_receipts: receipts
            .iter()
            .filter(|r| r.total_amount == Decimal::ZERO)
            .count(),
        charge_events: count_kind(EventType::ChargeCreated),
        payment_received_events: count_kind(EventType::PaymentReceived),
        payment_cancelled_events: count_kind(EventType::PaymentCancelled),
        unresolved_enrol_codes: unresolved.enrol_codes.len(),
        unresolved_student_ids: unresolved.student_ids.len(),
        unresolved_enrol_code_sample: unresolved
            .enrol_codes
            .iter()
            .take(UNRESOLVED_SAMPLE)
            .cloned()
            .collect(),
        unresolved_student_id_sample: unresolved
            .student_ids
            .iter()
            .take(UNRESOLVED_SAMPLE)
            .cloned()
            .collect(),
        quality: input.quality.clone(),
    }
}
