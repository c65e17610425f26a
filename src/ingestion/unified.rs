//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`] or [`ingest_from_bytes`], which run the whole
//! pipeline for one upload:
//!
//! 1. format detection from the file name ([`super::format::detect_file_format`]) unless
//!    [`IngestionOptions::format`] forces one; nothing is read before this passes
//! 2. size pre-flight ([`super::validation::validate_size`])
//! 3. the CSV parser (whole-file or streaming) or the spreadsheet parser
//! 4. optional header-row reselection ([`IngestionOptions::start_row`])
//!
//! If an [`IngestionObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{ErrorKind, IngestionError, IngestionResult};
use crate::types::ParsedTable;

use super::control::{CancellationToken, ParseControl, ProgressCallback};
use super::csv::{self, CsvOptions};
use super::format::{FileFormat, ParseStrategy, detect_file_format};
use super::header::select_header_row;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::validation::{SANITY_SIZE_LIMIT, validate_size};

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, detect the format from the file extension.
    pub format: Option<FileFormat>,
    /// CSV tuning (chunk size, high-water mark, streaming threshold, forced delimiter).
    pub csv: CsvOptions,
    /// Physical row to promote to the header after parsing; `0` keeps the parser's header.
    pub start_row: usize,
    /// Uploads larger than this are rejected before parsing.
    pub max_file_size: u64,
    /// Optional progress callback, fed fractions in `[0, 1]`.
    pub progress: Option<ProgressCallback>,
    /// Optional cancellation token checked while parsing.
    pub cancellation: Option<CancellationToken>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("csv", &self.csv)
            .field("start_row", &self.start_row)
            .field("max_file_size", &self.max_file_size)
            .field("progress_set", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            csv: CsvOptions::default(),
            start_row: 0,
            max_file_size: SANITY_SIZE_LIMIT,
            progress: None,
            cancellation: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    fn control(&self) -> ParseControl {
        let mut control = ParseControl::new();
        if let Some(progress) = &self.progress {
            control = control.with_progress(Arc::clone(progress));
        }
        if let Some(token) = &self.cancellation {
            control = control.with_cancellation(token.clone());
        }
        control
    }

    fn resolve_format(&self, file_name: &str) -> IngestionResult<FileFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => detect_file_format(file_name),
        }
    }

    fn strategy(&self, format: FileFormat, byte_size: u64) -> ParseStrategy {
        ParseStrategy::for_size(format, byte_size, self.csv.large_file_threshold)
    }
}

/// Ingest the file at `path`.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabular_ingestion::ingestion::{ingest_from_path, IngestionOptions, TracingObserver};
/// use tabular_ingestion::inference::infer_column_types;
///
/// # fn main() -> Result<(), tabular_ingestion::IngestionError> {
/// let opts = IngestionOptions {
///     progress: Some(Arc::new(|p| println!("{:.0}%", p * 100.0))),
///     observer: Some(Arc::new(TracingObserver)),
///     ..Default::default()
/// };
/// let table = ingest_from_path("sales.csv", &opts)?;
/// let types = infer_column_types(&table);
/// println!("rows={} types={:?}", table.row_count(), types);
/// # Ok(())
/// # }
/// ```
///
/// ## Excel (feature-gated, on by default)
///
/// ```no_run
/// use tabular_ingestion::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), tabular_ingestion::IngestionError> {
/// // Only the first sheet is read; start_row = 2 promotes physical row 2 to the header.
/// let opts = IngestionOptions { start_row: 2, ..Default::default() };
/// let table = ingest_from_path("workbook.xlsx", &opts)?;
/// println!("headers={:?}", table.headers());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<ParsedTable> {
    let path = path.as_ref();
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut ctx = IngestionContext {
        source,
        format: options.format,
    };
    let result = ingest_path_inner(path, options, &mut ctx);
    notify(options, &ctx, &result);
    result
}

fn ingest_path_inner(
    path: &Path,
    options: &IngestionOptions,
    ctx: &mut IngestionContext,
) -> IngestionResult<ParsedTable> {
    // extension before any I/O
    let format = options.resolve_format(&ctx.source)?;
    ctx.format = Some(format);
    let byte_size = fs::metadata(path)?.len();
    validate_size(&ctx.source, byte_size, options.max_file_size)?;

    let control = options.control();
    let table = match format {
        FileFormat::Csv => {
            let strategy = options.strategy(format, byte_size);
            csv::parse_csv_from_path(path, strategy, &options.csv, &control)?
        }
        FileFormat::Spreadsheet => spreadsheet_from_path(path, &control)?,
    };
    Ok(reselect(table, options.start_row))
}

/// Ingest an upload already held in memory, named `file_name`.
pub fn ingest_from_bytes(
    file_name: &str,
    bytes: &[u8],
    options: &IngestionOptions,
) -> IngestionResult<ParsedTable> {
    let mut ctx = IngestionContext {
        source: file_name.to_string(),
        format: options.format,
    };
    let result = ingest_bytes_inner(bytes, options, &mut ctx);
    notify(options, &ctx, &result);
    result
}

fn ingest_bytes_inner(
    bytes: &[u8],
    options: &IngestionOptions,
    ctx: &mut IngestionContext,
) -> IngestionResult<ParsedTable> {
    let format = options.resolve_format(&ctx.source)?;
    ctx.format = Some(format);
    let byte_size = bytes.len() as u64;
    validate_size(&ctx.source, byte_size, options.max_file_size)?;

    let control = options.control();
    let table = match format {
        FileFormat::Csv => {
            let strategy = options.strategy(format, byte_size);
            csv::parse_csv_from_reader(bytes, byte_size, strategy, &options.csv, &control)?
        }
        FileFormat::Spreadsheet => spreadsheet_from_bytes(bytes, &control)?,
    };
    Ok(reselect(table, options.start_row))
}

fn reselect(table: ParsedTable, start_row: usize) -> ParsedTable {
    if start_row == 0 {
        table
    } else {
        select_header_row(&table, start_row)
    }
}

fn notify(options: &IngestionOptions, ctx: &IngestionContext, result: &IngestionResult<ParsedTable>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(table) => obs.on_success(
            ctx,
            IngestionStats {
                rows: table.row_count(),
                columns: table.headers().len(),
            },
        ),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e.kind() {
        ErrorKind::FileRead => IngestionSeverity::Critical,
        ErrorKind::Cancelled => IngestionSeverity::Warning,
        ErrorKind::FileFormat | ErrorKind::Parse | ErrorKind::Validation => IngestionSeverity::Error,
    }
}

fn spreadsheet_from_path(path: &Path, control: &ParseControl) -> IngestionResult<ParsedTable> {
    #[cfg(feature = "excel")]
    {
        super::excel::parse_spreadsheet_from_path(path, control)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (path, control);
        Err(excel_disabled())
    }
}

fn spreadsheet_from_bytes(bytes: &[u8], control: &ParseControl) -> IngestionResult<ParsedTable> {
    #[cfg(feature = "excel")]
    {
        super::excel::parse_spreadsheet_from_bytes(bytes, control)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (bytes, control);
        Err(excel_disabled())
    }
}

#[cfg(not(feature = "excel"))]
fn excel_disabled() -> IngestionError {
    IngestionError::parse("spreadsheet ingestion not enabled (enable cargo feature 'excel')")
}

/// An owned ingestion job, useful for queuing uploads.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Create a request with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: IngestionOptions::default(),
        }
    }

    /// Execute the request by calling [`ingest_from_path`].
    pub fn run(&self) -> IngestionResult<ParsedTable> {
        ingest_from_path(&self.path, &self.options)
    }
}

/// Ingest several files concurrently.
///
/// Each request is parsed independently on the `rayon` pool with its own state; results come
/// back in request order and one failure does not affect the others.
pub fn ingest_many(requests: &[IngestionRequest]) -> Vec<IngestionResult<ParsedTable>> {
    requests.par_iter().map(IngestionRequest::run).collect()
}
