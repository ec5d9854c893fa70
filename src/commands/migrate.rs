// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::loaders::{self, QualityStats};
use crate::pipeline::{self, MigrationInput, RunSummary};
use crate::utils::{maybe_print_json, pretty_table};
use crate::writer;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn handle(sub: &clap::ArgMatches) -> Result<()> {
    let enrollments = path_arg(sub, "enrollments");
    let students = path_arg(sub, "students");
    let components = path_arg(sub, "components");
    let receipts = path_arg(sub, "receipts");
    let balances = sub.get_one::<String>("balances").map(|s| PathBuf::from(s.trim()));
    let out_dir = path_arg(sub, "out");
    let json_flag = sub.get_flag("json");
    let quality_flag = sub.get_flag("quality-report");

    let mut quality = QualityStats::default();

    let indexes = loaders::load_indexes(&enrollments, &students)
        .context("Load enrollment and student mappings")?;
    if !json_flag {
        println!(
            "Loaded {} enrollment codes, {} legacy student ids",
            indexes.by_code.len(),
            indexes.students.len()
        );
    }

    let components = loaders::load_components(&components).context("Load fee components")?;
    let legacy_receipts =
        loaders::load_receipts(&receipts, &mut quality).context("Load legacy receipts")?;
    let snapshots = loaders::load_snapshots(balances.as_deref(), &mut quality)
        .context("Load balance snapshots")?;
    if !json_flag {
        println!(
            "Loaded {} legacy receipts, {} balance snapshots",
            legacy_receipts.len(),
            snapshots.len()
        );
    }

    let input = MigrationInput {
        indexes,
        components,
        receipts: legacy_receipts,
        snapshots,
        quality,
    };
    let output = pipeline::run(&input);

    writer::write_outputs(&out_dir, &output).context("Write output tables")?;

    if maybe_print_json(json_flag, &output.summary)? {
        return Ok(());
    }
    print_summary(&out_dir, &output.summary, quality_flag);
    Ok(())
}

fn path_arg(sub: &clap::ArgMatches, name: &str) -> PathBuf {
    sub.get_one::<String>(name)
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_default()
}

fn print_summary(out_dir: &Path, summary: &RunSummary, quality_flag: bool) {
    let mut rows = vec![
        vec!["legacy receipts".to_string(), summary.legacy_receipts.to_string()],
        vec!["migrated receipts".to_string(), summary.processed_receipts.to_string()],
        vec!["unresolved receipts".to_string(), summary.unresolved_receipts.to_string()],
        vec!["ledger events".to_string(), summary.ledger_events.to_string()],
        vec!["allocations".to_string(), summary.allocations.to_string()],
        vec!["balance records".to_string(), summary.balance_records.to_string()],
        vec!["active receipts".to_string(), summary.active_receipts.to_string()],
        vec!["cancelled receipts".to_string(), summary.cancelled_receipts.to_string()],
        vec!["zero-amount receipts".to_string(), summary.zero_amount_receipts.to_string()],
        vec!["charge events".to_string(), summary.charge_events.to_string()],
        vec![
            "payment received events".to_string(),
            summary.payment_received_events.to_string(),
        ],
        vec![
            "payment cancelled events".to_string(),
            summary.payment_cancelled_events.to_string(),
        ],
    ];
    if quality_flag {
        rows.push(vec![
            "malformed amounts coerced".to_string(),
            summary.quality.bad_amounts.to_string(),
        ]);
        rows.push(vec![
            "malformed dates coerced".to_string(),
            summary.quality.bad_dates.to_string(),
        ]);
    }
    println!("{}", pretty_table(&["Metric", "Count"], rows));

    if summary.unresolved_receipts > 0 {
        println!(
            "Warning: {} enrollment codes could not be mapped:",
            summary.unresolved_enrol_codes
        );
        for code in &summary.unresolved_enrol_code_sample {
            println!("  - {}", code);
        }
        let shown = summary.unresolved_enrol_code_sample.len();
        if summary.unresolved_enrol_codes > shown {
            println!("  ... and {} more", summary.unresolved_enrol_codes - shown);
        }
    }
    println!("Wrote output tables to {}", out_dir.display());
}
