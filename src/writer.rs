// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::pipeline::MigrationOutput;
use crate::utils::money;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const RECEIPTS_FILE: &str = "fee_receipts.csv";
pub const EVENTS_FILE: &str = "fee_ledger_events.csv";
pub const ALLOCATIONS_FILE: &str = "fee_receipt_allocations.csv";
pub const BALANCES_FILE: &str = "fee_receipt_balance_records.csv";

const MIGRATION_USER: &str = "SYSTEM_MIGRATION";

/// Serialize the four output tables into `dir`. Every monetary column is
/// rendered with two decimals; every row keeps its legacy provenance id.
pub fn write_outputs(dir: &Path, output: &MigrationOutput) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Create output dir {}", dir.display()))?;
    write_receipts(&dir.join(RECEIPTS_FILE), output)?;
    write_events(&dir.join(EVENTS_FILE), output)?;
    write_allocations(&dir.join(ALLOCATIONS_FILE), output)?;
    write_balance_records(&dir.join(BALANCES_FILE), output)?;
    Ok(())
}

fn write_receipts(path: &Path, output: &MigrationOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Create CSV {}", path.display()))?;
    wtr.write_record([
        "id",
        "receipt_number",
        "receipt_date",
        "enrollment_id",
        "academic_year",
        "total_amount",
        "paid_amount",
        "balance_amount",
        "payment_method",
        "payment_reference",
        "payment_date",
        "legacy_reg_fee",
        "legacy_sec_fee",
        "legacy_tut_fee",
        "legacy_other_fee",
        "legacy_pre_bal",
        "legacy_rebate",
        "status",
        "comments",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "legacy_receipt_id",
    ])?;
    for r in &output.receipts {
        wtr.write_record([
            r.id.to_string(),
            r.receipt_number.clone(),
            r.receipt_date.to_string(),
            r.enrollment_id.clone(),
            r.academic_year.clone(),
            money(r.total_amount),
            money(r.paid_amount),
            money(r.balance_amount),
            r.payment_method.as_str().to_string(),
            r.payment_reference.clone(),
            r.receipt_date.to_string(),
            money(r.legacy_reg_fee),
            money(r.legacy_sec_fee),
            money(r.legacy_tut_fee),
            money(r.legacy_other_fee),
            money(r.legacy_pre_bal),
            money(r.legacy_rebate),
            r.status.as_str().to_string(),
            r.comments.clone(),
            MIGRATION_USER.to_string(),
            MIGRATION_USER.to_string(),
            r.created_at.clone(),
            r.created_at.clone(),
            r.legacy_receipt_id.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_events(path: &Path, output: &MigrationOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Create CSV {}", path.display()))?;
    wtr.write_record([
        "id",
        "event_type",
        "event_date",
        "enrollment_id",
        "academic_year",
        "fee_component_id",
        "amount",
        "running_balance",
        "receipt_id",
        "description",
        "created_by",
        "created_at",
        "legacy_receipt_id",
    ])?;
    for e in &output.events {
        wtr.write_record([
            e.id.to_string(),
            e.event_type.as_str().to_string(),
            e.event_date.to_string(),
            e.enrollment_id.clone(),
            e.academic_year.clone(),
            e.fee_component_id.clone(),
            money(e.amount),
            money(e.running_balance),
            e.receipt_id.map(|u| u.to_string()).unwrap_or_default(),
            e.description.clone(),
            MIGRATION_USER.to_string(),
            e.created_at.clone(),
            e.legacy_receipt_id.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_allocations(path: &Path, output: &MigrationOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Create CSV {}", path.display()))?;
    wtr.write_record([
        "id",
        "receipt_id",
        "ledger_event_id",
        "fee_component_id",
        "allocated_amount",
        "enrollment_id",
        "academic_year",
        "receipt_date",
        "created_at",
        "legacy_receipt_id",
    ])?;
    for a in &output.allocations {
        wtr.write_record([
            a.id.to_string(),
            a.receipt_id.to_string(),
            a.ledger_event_id.to_string(),
            a.fee_component_id.clone(),
            money(a.allocated_amount),
            a.enrollment_id.clone(),
            a.academic_year.clone(),
            a.receipt_date.to_string(),
            a.created_at.clone(),
            a.legacy_receipt_id.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_balance_records(path: &Path, output: &MigrationOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Create CSV {}", path.display()))?;
    wtr.write_record([
        "id",
        "receipt_id",
        "fee_component_id",
        "charge_amount",
        "paid_amount",
        "balance_amount",
        "enrollment_id",
        "academic_year",
        "receipt_date",
        "created_at",
        "legacy_receipt_id",
    ])?;
    for b in &output.balance_records {
        wtr.write_record([
            b.id.to_string(),
            b.receipt_id.to_string(),
            b.fee_component_id.clone(),
            money(b.charge_amount),
            money(b.paid_amount),
            money(b.balance_amount),
            b.enrollment_id.clone(),
            b.academic_year.clone(),
            b.receipt_date.to_string(),
            b.created_at.clone(),
            b.legacy_receipt_id.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
