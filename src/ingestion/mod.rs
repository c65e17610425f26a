//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] or [`ingest_from_bytes`] (from [`unified`])
//! which:
//!
//! - checks the upload size and picks a parser from the file extension (or you can override it
//!   via [`IngestionOptions`])
//! - parses into a canonical [`crate::types::ParsedTable`]
//! - optionally promotes a later row to be the header
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)
//!
//! Preview helpers for the header-row picker live in [`raw`] and [`header`].

pub mod assemble;
pub mod control;
pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod format;
pub mod header;
pub mod observability;
pub mod raw;
pub mod unified;
pub mod validation;

pub use control::{CancellationToken, ParseControl, ProgressCallback};
pub use format::{FileFormat, FormatDecision, ParseStrategy, detect_file_format, detect_format};
pub use header::{recommend_start_row, select_header_row};
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use raw::{RawText, read_raw_from_bytes, read_raw_from_path};
pub use unified::{IngestionOptions, IngestionRequest, ingest_from_bytes, ingest_from_path, ingest_many};
pub use validation::{SANITY_SIZE_LIMIT, UPLOAD_SIZE_LIMIT, validate_upload};
