// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("feeledger")
        .version(crate_version!())
        .about("Migrate legacy academic fee records into an event-sourced fee ledger")
        .subcommand(
            Command::new("migrate")
                .about("Transform legacy fee CSV exports into the four target ledger tables")
                .arg(
                    Arg::new("enrollments")
                        .long("enrollments")
                        .value_name("FILE")
                        .required(true)
                        .help("Enrollment table CSV (enrollment_code, enrollment_id, student_id, ...)"),
                )
                .arg(
                    Arg::new("students")
                        .long("students")
                        .value_name("FILE")
                        .required(true)
                        .help("Student table CSV (legacy_student_id, student_id)"),
                )
                .arg(
                    Arg::new("components")
                        .long("components")
                        .value_name("FILE")
                        .required(true)
                        .help("Fee component reference CSV (internal_code, target_id, label)"),
                )
                .arg(
                    Arg::new("receipts")
                        .long("receipts")
                        .value_name("FILE")
                        .required(true)
                        .help("Legacy fee receipts CSV"),
                )
                .arg(
                    Arg::new("balances")
                        .long("balances")
                        .value_name("FILE")
                        .help("Legacy balance-after snapshots CSV (optional; absent reads as zero)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .required(true)
                        .help("Directory for the four output CSV tables"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run summary as JSON"),
                )
                .arg(
                    Arg::new("quality-report")
                        .long("quality-report")
                        .action(ArgAction::SetTrue)
                        .help("Include aggregate malformed-field counts in the summary"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Verify a produced output set: balance replay, charges, numbering, references")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_name("DIR")
                        .required(true)
                        .help("Directory holding the four output CSV tables"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print findings as JSON"),
                ),
        )
}
