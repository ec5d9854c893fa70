// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::loaders::Indexes;
use crate::models::LegacyReceipt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

// Enrollment codes often end with the student id before the admission year,
// e.g. "AIMT(H)/10384/2023".
static TRAILING_STUDENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)/\d{4}$").unwrap());

type Strategy = fn(&LegacyReceipt, &Indexes) -> Option<String>;

/// Direct lookup: legacy enrollment code straight into the enrollment-code
/// index.
fn by_enrollment_code(receipt: &LegacyReceipt, idx: &Indexes) -> Option<String> {
    if receipt.enrol_code.is_empty() {
        return None;
    }
    idx.enrollment_by_code(&receipt.enrol_code)
        .map(|e| e.enrollment_id.clone())
}

/// Indirect lookup: legacy student id -> target student id -> that
/// student's first enrollment.
fn by_student_id(receipt: &LegacyReceipt, idx: &Indexes) -> Option<String> {
    let target = idx.target_student_id(&receipt.student_id)?;
    idx.first_enrollment_for_student(target)
        .map(|e| e.enrollment_id.clone())
}

/// Pattern extraction: pull a candidate student id out of the enrollment
/// code's trailing `/<digits>/<year>` and retry the student route with it.
fn by_code_pattern(receipt: &LegacyReceipt, idx: &Indexes) -> Option<String> {
    let caps = TRAILING_STUDENT_ID.captures(&receipt.enrol_code)?;
    let extracted = caps.get(1)?.as_str();
    let target = idx.target_student_id(extracted)?;
    idx.first_enrollment_for_student(target)
        .map(|e| e.enrollment_id.clone())
}

const STRATEGIES: [Strategy; 3] = [by_enrollment_code, by_student_id, by_code_pattern];

/// Resolve a legacy receipt to a target enrollment id, first matching
/// strategy wins. Pure over the loaded indexes.
pub fn resolve_enrollment(receipt: &LegacyReceipt, idx: &Indexes) -> Option<String> {
    STRATEGIES.iter().find_map(|s| s(receipt, idx))
}

/// Diagnostics for receipts no strategy could place. Reported at the end of
/// a run, never raised as an error.
#[derive(Debug, Default)]
pub struct Unresolved {
    pub count: usize,
    pub enrol_codes: BTreeSet<String>,
    pub student_ids: BTreeSet<String>,
}

impl Unresolved {
    pub fn record(&mut self, receipt: &LegacyReceipt) {
        self.count += 1;
        let code = if receipt.enrol_code.is_empty() {
            "UNKNOWN"
        } else {
            receipt.enrol_code.as_str()
        };
        let student = if receipt.student_id.is_empty() {
            "UNKNOWN"
        } else {
            receipt.student_id.as_str()
        };
        self.enrol_codes.insert(code.to_string());
        self.student_ids.insert(student.to_string());
    }
}
