#![cfg(feature = "excel")]

//! Spreadsheet ingestion implementation.
//!
//! Only the first worksheet (by position) is read. Cells carry their cached values: formulas
//! are never evaluated and styles are never loaded. Date cells are converted to
//! [`Value::Date`].

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, DataType as _, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use crate::error::IngestionResult;
use crate::inference::parse_date_text;
use crate::types::{ParsedTable, Record, Value, placeholder_header};

use super::assemble::assemble;
use super::control::ParseControl;

/// Parse a workbook file (`.xlsx`, `.xls`).
pub fn parse_spreadsheet_from_path(
    path: impl AsRef<Path>,
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let bytes = fs::read(path)?;
    parse_spreadsheet_from_bytes(&bytes, control)
}

/// Parse a workbook held in memory.
///
/// Behavior:
/// - Picks the first sheet in the workbook
/// - Row 0 of the sheet's used range is the header row, unconditionally
/// - Reads remaining rows and converts cells into [`Value`]s
/// - A workbook without sheets, or with an empty first sheet, yields an empty table
pub fn parse_spreadsheet_from_bytes(
    bytes: &[u8],
    control: &ParseControl,
) -> IngestionResult<ParsedTable> {
    let mut progress = control.tracker();
    control.check_cancelled()?;
    progress.report(0.25);

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    progress.report(0.5);

    let Some(range) = workbook.worksheet_range_at(0) else {
        debug!("workbook has no sheets");
        progress.finish();
        return Ok(ParsedTable::empty());
    };
    let range = range?;
    control.check_cancelled()?;
    progress.report(0.75);

    let mut grid = range.rows();
    let headers: Vec<String> = match grid.next() {
        Some(row) => row
            .iter()
            .enumerate()
            .map(|(idx, c)| header_label(c).unwrap_or_else(|| placeholder_header(idx)))
            .collect(),
        None => Vec::new(),
    };

    let mut rows: Vec<Record> = Vec::with_capacity(range.height().saturating_sub(1));
    for row in grid {
        control.check_cancelled()?;
        rows.push(row.iter().map(convert_cell).collect());
    }

    debug!(rows = rows.len(), columns = headers.len(), "spreadsheet parsed");
    progress.finish();
    Ok(assemble(headers, rows))
}

fn header_label(c: &Data) -> Option<String> {
    convert_cell(c).to_header_label()
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Value::Number(*f),
        Data::Float(_) => Value::Null,
        Data::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(_) => c.as_date().map_or(Value::Null, Value::Date),
        Data::DateTimeIso(s) => parse_date_text(s).map_or_else(|| Value::Text(s.clone()), Value::Date),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn cells_convert_to_canonical_values() {
        assert_eq!(convert_cell(&Data::Empty), Value::Null);
        assert_eq!(convert_cell(&Data::String(String::new())), Value::Null);
        assert_eq!(convert_cell(&Data::Int(7)), Value::Number(7.0));
        assert_eq!(convert_cell(&Data::Float(1.5)), Value::Number(1.5));
        assert_eq!(convert_cell(&Data::Bool(true)), Value::Text("TRUE".into()));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-03-01T00:00:00".into())),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn header_labels_fall_back_to_none_for_blank_cells() {
        assert_eq!(header_label(&Data::Float(2024.0)).as_deref(), Some("2024"));
        assert_eq!(header_label(&Data::Empty), None);
    }

    #[test]
    fn corrupt_bytes_are_a_parse_error() {
        let err = parse_spreadsheet_from_bytes(b"definitely not a workbook", &ParseControl::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
