//! Header-row reselection.
//!
//! Both parsers take the first physical row as the header. When a file starts with title or
//! note rows, the caller picks the real header afterwards with [`select_header_row`], always
//! applied to the table as it came out of the parser.
//!
//! Row numbering counts non-blank rows only. The parser's header is physical row 0 and `rows()[i]` is physical row
//! `i + 1`. `select_header_row(table, k)` therefore promotes physical row `k` to be the header.
//! [`recommend_start_row`] returns the physical index of the first *data* row, so the matching
//! call is `select_header_row(table, recommended - 1)`.

use crate::inference::parse_strict_number;
use crate::types::{ParsedTable, RawTable, placeholder_header};

use super::assemble::assemble;

/// Re-derive headers and rows using physical row `start_row` as the header.
///
/// - `start_row == 0` returns the table unchanged.
/// - Otherwise `rows()[start_row - 1]` becomes the headers (blank cells are labelled
///   `Column N`) and only the rows after it are kept.
/// - If `start_row - 1` is past the last row, the headers are kept and no rows remain.
///
/// The input is never modified. Calling this on its own output consumes another row, so
/// always pass the original parse.
pub fn select_header_row(table: &ParsedTable, start_row: usize) -> ParsedTable {
    if start_row == 0 {
        return table.clone();
    }

    let Some(header_row) = table.rows().get(start_row - 1) else {
        return assemble(table.headers().to_vec(), Vec::new());
    };

    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, v)| v.to_header_label().unwrap_or_else(|| placeholder_header(idx)))
        .collect();
    let rows = table.rows()[start_row..].to_vec();
    assemble(headers, rows)
}

/// Suggest where the data starts in a raw preview.
///
/// Returns the index of the row holding the most cells that parse as finite numbers; the
/// earliest such row wins ties, and `0` is returned when no row has any numeric cell. The
/// row before the suggestion is the likely header. Advisory only; nothing applies it
/// automatically.
///
/// The index lines up with the parsed table only while the preview and the parser see the
/// same rows. Both drop blank rows and both end lines at `\n`, `\r\n` or `\r`, but the
/// preview does not honour quotes: a quoted field spanning lines in the rows above the
/// suggestion shifts it down by one per extra line.
pub fn recommend_start_row(preview: &RawTable) -> usize {
    let mut best = (0usize, 0usize);
    for (idx, row) in preview.rows.iter().enumerate() {
        let numeric = row
            .iter()
            .filter(|cell| parse_strict_number(cell).is_some())
            .count();
        if numeric > best.1 {
            best = (idx, numeric);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn titled_table() -> ParsedTable {
        assemble(
            vec!["Quarterly report".into(), "Column 2".into()],
            vec![
                vec![Value::Null, Value::Null],
                vec![text("region"), Value::Null],
                vec![text("north"), Value::Number(10.0)],
                vec![text("south"), Value::Number(12.0)],
            ],
        )
    }

    #[test]
    fn zero_returns_input_unchanged() {
        let t = titled_table();
        assert_eq!(select_header_row(&t, 0), t);
    }

    #[test]
    fn promotes_row_and_keeps_following_rows() {
        let t = titled_table();
        let out = select_header_row(&t, 2);
        assert_eq!(out.headers(), ["region", "Column 2"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows()[0], vec![text("north"), Value::Number(10.0)]);
        assert_eq!(out.preview().len(), 2);
        // original untouched
        assert_eq!(t.row_count(), 4);
    }

    #[test]
    fn numeric_header_cells_become_labels() {
        let t = assemble(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Number(2023.0), Value::Number(2024.5)], vec![text("x"), text("y")]],
        );
        assert_eq!(select_header_row(&t, 1).headers(), ["2023", "2024.5"]);
    }

    #[test]
    fn out_of_range_keeps_headers_without_rows() {
        let t = titled_table();
        let out = select_header_row(&t, 10);
        assert_eq!(out.headers(), t.headers());
        assert_eq!(out.row_count(), 0);
        assert!(out.preview().is_empty());
    }

    #[test]
    fn reapplying_to_original_is_stable_but_chaining_is_not() {
        let t = titled_table();
        let once = select_header_row(&t, 1);
        assert_eq!(once, select_header_row(&t, 1));
        let chained = select_header_row(&once, 1);
        assert_ne!(chained, once);
        assert_eq!(chained.headers(), ["region", "Column 2"]);
    }

    #[test]
    fn recommends_row_with_most_numbers() {
        let preview = RawTable::new(vec![
            vec!["Sales".into()],
            vec!["month".into(), "units".into(), "price".into()],
            vec!["jan".into(), "3".into(), "1.5".into()],
            vec!["feb".into(), "4".into(), "2.5".into()],
        ]);
        assert_eq!(recommend_start_row(&preview), 2);
        assert_eq!(recommend_start_row(&RawTable::default()), 0);
        let words = RawTable::new(vec![vec!["a".into()], vec!["Infinity".into()]]);
        assert_eq!(recommend_start_row(&words), 0);
    }
}
