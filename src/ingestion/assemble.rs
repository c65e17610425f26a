//! Canonical table assembly.
//!
//! Both parsers hand their header row and raw typed rows to [`assemble`], which is the only
//! place a [`ParsedTable`] is constructed.

use crate::types::{ParsedTable, Record, Value};

/// Build a [`ParsedTable`] from headers and rows.
///
/// Each row is normalised to `headers.len()` values: missing trailing cells become
/// [`Value::Null`], extra cells are dropped. Values are taken as-is; no type inference runs
/// here.
pub fn assemble(headers: Vec<String>, rows: Vec<Record>) -> ParsedTable {
    let width = headers.len();
    let rows = rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, Value::Null);
            row
        })
        .collect();
    ParsedTable { headers, rows }
}
