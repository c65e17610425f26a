//! Core data model types for ingestion.
//!
//! Every parser produces the same canonical [`ParsedTable`]: ordered headers, rows of typed
//! [`Value`]s positionally aligned to those headers, and a borrowed preview of the first
//! [`PREVIEW_ROWS`] rows. Column semantics ([`ColumnTypeMap`]) are computed on demand by
//! [`crate::inference`] and are never stored in the table.

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Number of leading rows exposed through [`ParsedTable::preview`].
pub const PREVIEW_ROWS: usize = 10;

/// A single dynamically typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// Finite number (integers included).
    Number(f64),
    /// Text that did not type as anything more specific.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a column label, or `None` when it is blank.
    ///
    /// Integral numbers lose their fractional part (`3.0` becomes `"3"`), dates render as
    /// `yyyy-mm-dd`.
    pub fn to_header_label(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Label used for header cells that are blank.
pub(crate) fn placeholder_header(index: usize) -> String {
    format!("Column {}", index + 1)
}

/// One data row, positionally aligned with [`ParsedTable::headers`].
pub type Record = Vec<Value>;

/// The canonical, immutable result of ingesting one file.
///
/// Built only through [`crate::ingestion::assemble::assemble`], which guarantees that every
/// record has exactly `headers().len()` values. Header reselection produces a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Record>,
}

impl ParsedTable {
    /// A table with no headers and no rows.
    pub fn empty() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Column names in file order. Duplicates are kept as-is.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order (header excluded).
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The first [`PREVIEW_ROWS`] rows, borrowed from [`Self::rows`].
    pub fn preview(&self) -> &[Record] {
        &self.rows[..self.rows.len().min(PREVIEW_ROWS)]
    }

    /// Returns the index of a column by name (first match), if present.
    pub fn index_of(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Value at `row` in the column named `header`.
    pub fn get(&self, row: usize, header: &str) -> Option<&Value> {
        let col = self.index_of(header)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Header-keyed view of one row.
    pub fn record(&self, row: usize) -> Option<impl Iterator<Item = (&str, &Value)>> {
        let values = self.rows.get(row)?;
        Some(self.headers.iter().map(String::as_str).zip(values.iter()))
    }

    /// Iterate the values of one column in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |r| r.get(index))
    }
}

impl Serialize for ParsedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ParsedTable", 4)?;
        s.serialize_field("headers", &self.headers)?;
        s.serialize_field("rows", &self.rows)?;
        s.serialize_field("rowCount", &self.row_count())?;
        s.serialize_field("preview", self.preview())?;
        s.end()
    }
}

/// Rows of untyped text cells, used to let a human pick the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Row-major raw cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a raw table from rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Dominant semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// More than 80% of the non-empty values are finite numbers.
    Number,
    /// Fallback classification.
    String,
    /// More than 80% of the non-empty values are recognised dates.
    Date,
}

/// Header name to [`ColumnType`], in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnTypeMap {
    entries: Vec<(String, ColumnType)>,
}

impl ColumnTypeMap {
    pub(crate) fn new(entries: Vec<(String, ColumnType)>) -> Self {
        Self { entries }
    }

    /// Type of the first column named `header`.
    pub fn get(&self, header: &str) -> Option<ColumnType> {
        self.entries
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, t)| *t)
    }

    /// Iterate `(header, type)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.entries.iter().map(|(h, t)| (h.as_str(), *t))
    }

    /// Headers of every column classified as `ty`, in header order.
    pub fn columns_of(&self, ty: ColumnType) -> Vec<&str> {
        self.iter()
            .filter(|(_, t)| *t == ty)
            .map(|(h, _)| h)
            .collect()
    }

    /// Number of `(number, string, date)` columns.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(n, s, d), (_, t)| match t {
                ColumnType::Number => (n + 1, s, d),
                ColumnType::String => (n, s + 1, d),
                ColumnType::Date => (n, s, d + 1),
            })
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
