//! `tabular-ingestion` turns uploaded CSV and Excel files into one canonical in-memory
//! [`types::ParsedTable`]: ordered headers, dynamically typed rows and a short preview.
//!
//! The primary entrypoints are [`ingestion::ingest_from_path`] and
//! [`ingestion::ingest_from_bytes`], which pick a parser from the file extension (or you can
//! force one via [`ingestion::IngestionOptions`]).
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension, case-insensitive):**
//!
//! - **CSV**: `.csv`. The delimiter is sniffed among `,` `\t` `|` `;`. Files at or above
//!   5 MiB are parsed in streaming mode behind a bounded row buffer.
//! - **Excel/workbooks** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`.
//!   Only the first sheet is read.
//!
//! **Cell values:**
//!
//! - [`types::Value::Null`] for empty cells
//! - [`types::Value::Number`] for unambiguous decimal numbers and numeric workbook cells
//! - [`types::Value::Date`] for workbook date cells
//! - [`types::Value::Text`] for everything else
//!
//! ## Quick example: ingest and classify columns
//!
//! ```no_run
//! use tabular_ingestion::ingestion::{ingest_from_path, IngestionOptions};
//! use tabular_ingestion::inference::infer_column_types;
//! use tabular_ingestion::types::ColumnType;
//!
//! # fn main() -> Result<(), tabular_ingestion::IngestionError> {
//! let table = ingest_from_path("sales.csv", &IngestionOptions::default())?;
//! let types = infer_column_types(&table);
//! println!("rows={} numeric={:?}", table.row_count(), types.columns_of(ColumnType::Number));
//! # Ok(())
//! # }
//! ```
//!
//! ## Picking the header row
//!
//! Files that start with a title block can be previewed raw, and the header reselected on the
//! already parsed table:
//!
//! ```rust
//! use tabular_ingestion::ingestion::csv::parse_csv_from_str;
//! use tabular_ingestion::ingestion::{read_raw_from_bytes, select_header_row};
//! use tabular_ingestion::types::RawTable;
//!
//! let input = "Sales report,\n,\nmonth,units\njan,3\nfeb,4\n";
//! let raw = read_raw_from_bytes(input.as_bytes(), None);
//! let preview = RawTable::from_text(&raw, b',', 10);
//! let recommended = preview.recommend_start_row();
//! assert_eq!(recommended, 2);
//!
//! let table = parse_csv_from_str(input).unwrap();
//! let fixed = select_header_row(&table, recommended - 1);
//! assert_eq!(fixed.headers(), ["month", "units"]);
//! assert_eq!(fixed.row_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified entrypoints, format detection, the CSV and Excel parsers, header
//!   selection, raw previews and observers
//! - [`inference`]: column type inference
//! - [`types`]: table and value types
//! - [`error`]: error types used across ingestion

pub mod error;
pub mod inference;
pub mod ingestion;
pub mod types;

pub use error::{ErrorKind, IngestionError, IngestionResult};
