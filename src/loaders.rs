// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{BalanceSnapshot, ComponentRef, Enrollment, FeeComponent, LegacyReceipt};
use crate::utils::{parse_amount, parse_flag, parse_legacy_date};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("required input file not found: {0}")]
    Missing(PathBuf),
}

/// Aggregate counters for silently coerced row-level defects.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct QualityStats {
    pub bad_amounts: usize,
    pub bad_dates: usize,
}

/// Read-only lookup structures built once before reconstruction begins.
///
/// Enrollments keep their input order; `first_by_student` is precomputed so
/// "first enrollment for a student" is deterministic regardless of map
/// iteration order.
#[derive(Debug, Default)]
pub struct Indexes {
    pub enrollments: Vec<Enrollment>,
    pub by_code: HashMap<String, usize>,
    pub first_by_student: HashMap<String, usize>,
    pub students: HashMap<String, String>,
}

impl Indexes {
    pub fn enrollment_by_code(&self, code: &str) -> Option<&Enrollment> {
        self.by_code.get(code).map(|&i| &self.enrollments[i])
    }

    pub fn first_enrollment_for_student(&self, target_student_id: &str) -> Option<&Enrollment> {
        self.first_by_student
            .get(target_student_id)
            .map(|&i| &self.enrollments[i])
    }

    pub fn target_student_id(&self, legacy_student_id: &str) -> Option<&str> {
        self.students.get(legacy_student_id).map(|s| s.as_str())
    }
}

/// The four fixed fee component rows, keyed by internal code.
#[derive(Debug, Clone)]
pub struct ComponentMap {
    refs: Vec<ComponentRef>,
}

impl ComponentMap {
    pub fn new(refs: Vec<ComponentRef>) -> Result<ComponentMap> {
        for component in FeeComponent::ALL {
            if !refs.iter().any(|r| r.component == component) {
                return Err(anyhow!(
                    "fee component reference is missing the {} row",
                    component.code()
                ));
            }
        }
        Ok(ComponentMap { refs })
    }

    pub fn get(&self, component: FeeComponent) -> &ComponentRef {
        // Completeness is validated at construction.
        self.refs
            .iter()
            .find(|r| r.component == component)
            .unwrap_or(&self.refs[0])
    }
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(InputError::Missing(path.to_path_buf()).into());
    }
    Ok(())
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn required_column(headers: &StringRecord, names: &[&str], file: &Path) -> Result<usize> {
    column(headers, names)
        .ok_or_else(|| anyhow!("{}: missing column '{}'", file.display(), names[0]))
}

fn field<'r>(rec: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| rec.get(i)).unwrap_or("").trim()
}

/// Load the enrollment and student tables into lookup indexes.
pub fn load_indexes(enrollments_path: &Path, students_path: &Path) -> Result<Indexes> {
    require_file(enrollments_path)?;
    require_file(students_path)?;

    let mut idx = Indexes::default();

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(enrollments_path)
        .with_context(|| format!("Open CSV {}", enrollments_path.display()))?;
    let headers = rdr.headers()?.clone();
    let code_i = required_column(&headers, &["enrollment_code"], enrollments_path)?;
    let id_i = required_column(&headers, &["enrollment_id", "id"], enrollments_path)?;
    let student_i = required_column(&headers, &["student_id"], enrollments_path)?;
    let course_i = column(&headers, &["course_id"]);
    let session_i = column(&headers, &["session_id"]);

    for result in rdr.records() {
        let rec = result?;
        let enrollment = Enrollment {
            enrollment_code: field(&rec, Some(code_i)).to_string(),
            enrollment_id: field(&rec, Some(id_i)).to_string(),
            student_id: field(&rec, Some(student_i)).to_string(),
            course_id: field(&rec, course_i).to_string(),
            session_id: field(&rec, session_i).to_string(),
        };
        if enrollment.enrollment_id.is_empty() {
            continue;
        }
        let pos = idx.enrollments.len();
        idx.by_code
            .entry(enrollment.enrollment_code.clone())
            .or_insert(pos);
        idx.first_by_student
            .entry(enrollment.student_id.clone())
            .or_insert(pos);
        idx.enrollments.push(enrollment);
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(students_path)
        .with_context(|| format!("Open CSV {}", students_path.display()))?;
    let headers = rdr.headers()?.clone();
    let legacy_i = required_column(&headers, &["legacy_student_id"], students_path)?;
    let target_i = required_column(&headers, &["student_id", "id"], students_path)?;
    for result in rdr.records() {
        let rec = result?;
        let legacy = field(&rec, Some(legacy_i)).to_string();
        let target = field(&rec, Some(target_i)).to_string();
        if !legacy.is_empty() && !target.is_empty() {
            idx.students.entry(legacy).or_insert(target);
        }
    }

    Ok(idx)
}

/// Load the fixed fee component reference table; all four codes must be
/// present.
pub fn load_components(path: &Path) -> Result<ComponentMap> {
    require_file(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let code_i = required_column(&headers, &["internal_code", "code"], path)?;
    let id_i = required_column(&headers, &["target_id", "id"], path)?;
    let label_i = required_column(&headers, &["label"], path)?;

    let mut refs = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let code = field(&rec, Some(code_i));
        let component = FeeComponent::from_code(code)
            .ok_or_else(|| anyhow!("{}: unknown fee component code '{}'", path.display(), code))?;
        refs.push(ComponentRef {
            component,
            target_id: field(&rec, Some(id_i)).to_string(),
            label: field(&rec, Some(label_i)).to_string(),
        });
    }
    ComponentMap::new(refs)
}

/// Load the legacy receipts in input order. Malformed amounts coerce to
/// zero, malformed dates to the fallback date; both feed the quality
/// counters.
pub fn load_receipts(path: &Path, stats: &mut QualityStats) -> Result<Vec<LegacyReceipt>> {
    require_file(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let id_i = required_column(&headers, &["id"], path)?;
    let student_i = required_column(&headers, &["student_id"], path)?;
    let enrol_i = required_column(&headers, &["enrol_id", "enrollment_code"], path)?;
    let date_i = required_column(&headers, &["fee_date"], path)?;
    let reg_i = column(&headers, &["reg_fee"]);
    let sec_i = column(&headers, &["sec_fee"]);
    let tut_i = column(&headers, &["tut_fee"]);
    let other_i = column(&headers, &["other_fee"]);
    let pre_bal_i = column(&headers, &["pre_bal"]);
    let rebate_i = column(&headers, &["rebate"]);
    let cancelled_i = column(&headers, &["is_cancelled"]);
    let method_i = column(&headers, &["payment_method"]);
    let reference_i = column(&headers, &["reference_number"]);
    let receipt_no_i = column(&headers, &["receipt_no", "receipt_number"]);
    let created_i = column(&headers, &["created_at"]);

    let amount = |raw: &str, stats: &mut QualityStats| -> Decimal {
        let (value, clean) = parse_amount(raw);
        if !clean {
            stats.bad_amounts += 1;
        }
        value
    };

    let mut receipts = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let id = field(&rec, Some(id_i)).to_string();
        if id.is_empty() {
            continue;
        }
        let (fee_date, date_ok) = parse_legacy_date(field(&rec, Some(date_i)));
        if !date_ok {
            stats.bad_dates += 1;
        }
        let receipt_no = Some(field(&rec, receipt_no_i))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        receipts.push(LegacyReceipt {
            id,
            student_id: field(&rec, Some(student_i)).to_string(),
            enrol_code: field(&rec, Some(enrol_i)).to_string(),
            fee_date,
            receipt_no,
            reg_fee: amount(field(&rec, reg_i), stats),
            sec_fee: amount(field(&rec, sec_i), stats),
            tut_fee: amount(field(&rec, tut_i), stats),
            other_fee: amount(field(&rec, other_i), stats),
            pre_bal: amount(field(&rec, pre_bal_i), stats),
            rebate: amount(field(&rec, rebate_i), stats),
            is_cancelled: parse_flag(field(&rec, cancelled_i)),
            payment_method: field(&rec, method_i).to_string(),
            reference_number: field(&rec, reference_i).to_string(),
            created_at: Some(field(&rec, created_i))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        });
    }
    Ok(receipts)
}

/// Load the balance-after snapshots keyed by legacy receipt id. The file
/// itself is optional; a duplicated receipt id keeps its first row.
pub fn load_snapshots(
    path: Option<&Path>,
    stats: &mut QualityStats,
) -> Result<HashMap<String, BalanceSnapshot>> {
    let mut snapshots = HashMap::new();
    let Some(path) = path else {
        return Ok(snapshots);
    };
    require_file(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let receipt_i = required_column(&headers, &["feereceipt_id", "receipt_id"], path)?;
    let reg_i = column(&headers, &["reg_balance"]);
    let sec_i = column(&headers, &["sec_balance"]);
    let tut_i = column(&headers, &["tut_balance"]);
    let other_i = column(&headers, &["other_balance"]);

    let amount = |raw: &str, stats: &mut QualityStats| -> Decimal {
        let (value, clean) = parse_amount(raw);
        if !clean {
            stats.bad_amounts += 1;
        }
        value
    };

    for result in rdr.records() {
        let rec = result?;
        let receipt_id = field(&rec, Some(receipt_i)).to_string();
        if receipt_id.is_empty() {
            continue;
        }
        let snapshot = BalanceSnapshot {
            receipt_id: receipt_id.clone(),
            reg_balance: amount(field(&rec, reg_i), stats),
            sec_balance: amount(field(&rec, sec_i), stats),
            tut_balance: amount(field(&rec, tut_i), stats),
            other_balance: amount(field(&rec, other_i), stats),
        };
        snapshots.entry(receipt_id).or_insert(snapshot);
    }
    Ok(snapshots)
}
