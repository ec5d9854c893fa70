// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table};
use crate::writer::{ALLOCATIONS_FILE, EVENTS_FILE, RECEIPTS_FILE};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct Finding {
    issue: String,
    detail: String,
}

pub fn handle(sub: &clap::ArgMatches) -> Result<()> {
    let dir = sub
        .get_one::<String>("dir")
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_default();
    let json_flag = sub.get_flag("json");

    let mut findings = Vec::new();
    let event_ids = check_events(&dir.join(EVENTS_FILE), &mut findings)?;
    let receipt_ids = check_receipts(&dir.join(RECEIPTS_FILE), &mut findings)?;
    check_allocations(
        &dir.join(ALLOCATIONS_FILE),
        &receipt_ids,
        &event_ids,
        &mut findings,
    )?;

    if maybe_print_json(json_flag, &findings)? {
        return Ok(());
    }
    if findings.is_empty() {
        println!("check: no issues found");
    } else {
        let rows = findings
            .iter()
            .map(|f| vec![f.issue.clone(), f.detail.clone()])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

fn open(path: &Path) -> Result<(csv::Reader<std::fs::File>, StringRecord)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    Ok((rdr, headers))
}

fn col(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("{}: missing column '{}'", path.display(), name))
}

fn amount(rec: &StringRecord, idx: usize) -> Decimal {
    rec.get(idx)
        .and_then(|s| s.trim().parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO)
}

/// Replay the event table: within each (enrollment, component) pair the
/// first event must be a non-negative CHARGE_CREATED whose running balance
/// equals its amount, and every later running balance must equal the prior
/// one plus the event's signed amount.
fn check_events(path: &Path, findings: &mut Vec<Finding>) -> Result<HashSet<String>> {
    let (mut rdr, headers) = open(path)?;
    let id_i = col(&headers, "id", path)?;
    let type_i = col(&headers, "event_type", path)?;
    let enrollment_i = col(&headers, "enrollment_id", path)?;
    let component_i = col(&headers, "fee_component_id", path)?;
    let amount_i = col(&headers, "amount", path)?;
    let running_i = col(&headers, "running_balance", path)?;

    let mut event_ids = HashSet::new();
    let mut running: HashMap<(String, String), Decimal> = HashMap::new();
    for result in rdr.records() {
        let rec = result?;
        let id = rec.get(id_i).unwrap_or("").to_string();
        event_ids.insert(id.clone());
        let kind = rec.get(type_i).unwrap_or("");
        let key = (
            rec.get(enrollment_i).unwrap_or("").to_string(),
            rec.get(component_i).unwrap_or("").to_string(),
        );
        let signed = amount(&rec, amount_i);
        let balance = amount(&rec, running_i);
        match running.get(&key) {
            None => {
                if kind != "CHARGE_CREATED" {
                    findings.push(Finding {
                        issue: "first_event_not_charge".into(),
                        detail: format!("event {} is {}", id, kind),
                    });
                } else if signed < Decimal::ZERO || balance != signed {
                    findings.push(Finding {
                        issue: "bad_opening_charge".into(),
                        detail: format!("event {} amount {} running {}", id, signed, balance),
                    });
                }
            }
            Some(prev) => {
                if *prev + signed != balance {
                    findings.push(Finding {
                        issue: "running_balance_mismatch".into(),
                        detail: format!(
                            "event {} expected {} got {}",
                            id,
                            *prev + signed,
                            balance
                        ),
                    });
                }
            }
        }
        running.insert(key, balance);
    }
    Ok(event_ids)
}

/// Receipt numbers must be unique across the whole run.
fn check_receipts(path: &Path, findings: &mut Vec<Finding>) -> Result<HashSet<String>> {
    let (mut rdr, headers) = open(path)?;
    let id_i = col(&headers, "id", path)?;
    let number_i = col(&headers, "receipt_number", path)?;

    let mut receipt_ids = HashSet::new();
    let mut numbers = HashSet::new();
    for result in rdr.records() {
        let rec = result?;
        receipt_ids.insert(rec.get(id_i).unwrap_or("").to_string());
        let number = rec.get(number_i).unwrap_or("").to_string();
        if !numbers.insert(number.clone()) {
            findings.push(Finding {
                issue: "duplicate_receipt_number".into(),
                detail: number,
            });
        }
    }
    Ok(receipt_ids)
}

/// Every allocation must point at an existing receipt and ledger event.
fn check_allocations(
    path: &Path,
    receipt_ids: &HashSet<String>,
    event_ids: &HashSet<String>,
    findings: &mut Vec<Finding>,
) -> Result<()> {
    let (mut rdr, headers) = open(path)?;
    let id_i = col(&headers, "id", path)?;
    let receipt_i = col(&headers, "receipt_id", path)?;
    let event_i = col(&headers, "ledger_event_id", path)?;

    for result in rdr.records() {
        let rec = result?;
        let id = rec.get(id_i).unwrap_or("");
        let receipt_id = rec.get(receipt_i).unwrap_or("");
        let event_id = rec.get(event_i).unwrap_or("");
        if !receipt_ids.contains(receipt_id) {
            findings.push(Finding {
                issue: "allocation_orphan_receipt".into(),
                detail: format!("allocation {} receipt {}", id, receipt_id),
            });
        }
        if !event_ids.contains(event_id) {
            findings.push(Finding {
                issue: "allocation_orphan_event".into(),
                detail: format!("allocation {} event {}", id, event_id),
            });
        }
    }
    Ok(())
}
