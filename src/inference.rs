//! Column type inference.
//!
//! [`infer_column_types`] classifies every column of a [`ParsedTable`] as
//! [`ColumnType::Number`], [`ColumnType::Date`] or [`ColumnType::String`] from the values it
//! holds. It is opt-in: ingestion never runs it, consumers such as chart recommendation call it
//! when they need column semantics.
//!
//! Per column:
//!
//! 1. Candidates are the non-null values; text that is empty or whitespace only is skipped.
//!    No candidates means `String`.
//! 2. If more than 80% of candidates are numbers (or text in strict decimal notation), the
//!    column is `Number`. This check wins over the date check.
//! 3. Else if more than 80% are dates (or text shaped like `yyyy-mm-dd`, `m/d/yyyy` or
//!    `m-d-yyyy` naming a real calendar day), the column is `Date`.
//! 4. Otherwise `String`.
//!
//! ```rust
//! use tabular_ingestion::ingestion::csv::parse_csv_from_str;
//! use tabular_ingestion::inference::infer_column_types;
//! use tabular_ingestion::types::ColumnType;
//!
//! let table = parse_csv_from_str("day,sales\n2024-01-01,10\n2024-01-02,12\n").unwrap();
//! let types = infer_column_types(&table);
//! assert_eq!(types.get("day"), Some(ColumnType::Date));
//! assert_eq!(types.get("sales"), Some(ColumnType::Number));
//! ```

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use crate::types::{ColumnType, ColumnTypeMap, ParsedTable, Value};

/// A column is numeric when strictly more than this share of its values are numbers.
pub const NUMBER_THRESHOLD: f64 = 0.8;

/// A column is a date column when strictly more than this share of its values are dates.
pub const DATE_THRESHOLD: f64 = 0.8;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("valid iso date regex"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid slash date regex"));
static DASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("valid dash date regex"));

/// Classify every column of `table`, in header order.
pub fn infer_column_types(table: &ParsedTable) -> ColumnTypeMap {
    let entries = table
        .headers()
        .par_iter()
        .enumerate()
        .map(|(idx, header)| (header.clone(), infer_column_type(table.column_values(idx))))
        .collect();
    ColumnTypeMap::new(entries)
}

/// Classify a single column from its values.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let candidates: Vec<&Value> = values.into_iter().filter(|v| is_candidate(v)).collect();
    if candidates.is_empty() {
        return ColumnType::String;
    }
    let total = candidates.len() as f64;

    let numeric = candidates.iter().filter(|v| is_numeric(v)).count();
    if numeric as f64 / total > NUMBER_THRESHOLD {
        return ColumnType::Number;
    }

    let dates = candidates.iter().filter(|v| is_date(v)).count();
    if dates as f64 / total > DATE_THRESHOLD {
        return ColumnType::Date;
    }

    ColumnType::String
}

fn is_candidate(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Text(s) => !s.trim().is_empty(),
        Value::Number(_) | Value::Date(_) => true,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite(),
        Value::Text(s) => parse_strict_number(s).is_some(),
        Value::Null | Value::Date(_) => false,
    }
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(s) => parse_date_text(s).is_some(),
        Value::Null | Value::Number(_) => false,
    }
}

/// Parse `raw` as a finite number written in plain decimal notation.
///
/// Accepts surrounding whitespace, one leading sign, digits with an optional fractional part
/// and an optional exponent (`1`, `-2.5`, `.5`, `3.`, `1e-3`). Rejects everything else,
/// including `Infinity`, `NaN`, hex, and grouping separators.
pub fn parse_strict_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
        if digits.is_empty() || !all_digits(digits) {
            return None;
        }
    }

    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse text shaped like `yyyy-mm-dd…`, `m/d/yyyy…` or exactly `m-d-yyyy` into a date.
///
/// The shape must name a real calendar day (`2023-02-30` is rejected). Slash and dash forms
/// are read month first.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Some(c) = ISO_DATE.captures(s) {
        return ymd(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = SLASH_DATE.captures(s).or_else(|| DASH_DATE.captures(s)) {
        return ymd(&c[3], &c[1], &c[2]);
    }
    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
