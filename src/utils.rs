// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

/// Fallback for legacy dates that cannot be repaired.
pub fn fallback_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

/// Parse a legacy date, tolerating the export's known defects: a `00xx`
/// year is read as `20xx`, datetime strings are accepted, and anything
/// unparseable coerces to the fixed fallback date.
///
/// Returns the date plus whether the raw value was usable as-is.
pub fn parse_legacy_date(raw: &str) -> (NaiveDate, bool) {
    let mut s = raw.trim().to_string();
    if s.is_empty() {
        return (fallback_date(), false);
    }
    // Legacy export contains years like 0024 for 2024.
    if s.starts_with("00") {
        s = format!("20{}", &s[2..]);
    }
    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return (d, true);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return (dt.date(), true);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&s, "%d/%m/%Y") {
        return (d, true);
    }
    (fallback_date(), false)
}

/// Parse a legacy monetary field. Blank, unparseable and negative values
/// all coerce to zero; the flag reports whether coercion happened on a
/// non-blank value so callers can keep an aggregate count.
pub fn parse_amount(raw: &str) -> (Decimal, bool) {
    let s = raw.trim();
    if s.is_empty() {
        return (Decimal::ZERO, true);
    }
    match s.parse::<Decimal>() {
        Ok(d) if d >= Decimal::ZERO => (d, true),
        Ok(_) => (Decimal::ZERO, false),
        Err(_) => (Decimal::ZERO, false),
    }
}

/// Truthy test for legacy boolean exports ("True", "1", "t", "yes").
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "t" | "yes"
    )
}

/// Academic-year label for a date, on a July-starting calendar:
/// 2023-07-01 -> "2023-24", 2023-06-30 -> "2022-23".
pub fn academic_year(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 7 {
        format!("{}-{:02}", year, (year + 1) % 100)
    } else {
        format!("{}-{:02}", year - 1, year % 100)
    }
}

/// Two-decimal money rendering for the CSV boundary.
pub fn money(d: Decimal) -> String {
    format!("{:.2}", d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> anyhow::Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}
