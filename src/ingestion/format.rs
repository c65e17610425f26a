//! Format detection: picks a parser (and a CSV strategy) from a file name and size.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};

/// CSV files at or above this size are parsed with [`ParseStrategy::Streaming`].
pub const LARGE_FILE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Delimited text (comma, tab, pipe or semicolon).
    Csv,
    /// Binary workbook (`.xlsx`, `.xls`).
    Spreadsheet,
}

impl FileFormat {
    /// Parse a format from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// MIME type for an upload named `file_name`.
    ///
    /// Unknown extensions map to `application/octet-stream`.
    pub fn mime_type_for(file_name: &str) -> &'static str {
        match extension_of(file_name).to_ascii_lowercase().as_str() {
            "csv" => "text/csv",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xls" => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }
}

/// How a CSV file is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseStrategy {
    /// Tokenize on the calling thread.
    WholeFile,
    /// Tokenize on a producer thread behind a bounded row channel.
    Streaming,
}

impl ParseStrategy {
    /// Streaming for CSV inputs of at least `large_file_threshold` bytes, whole-file otherwise.
    pub fn for_size(format: FileFormat, byte_size: u64, large_file_threshold: u64) -> Self {
        match format {
            FileFormat::Csv if byte_size >= large_file_threshold => Self::Streaming,
            _ => Self::WholeFile,
        }
    }
}

/// Result of [`detect_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDecision {
    /// Parser family.
    pub format: FileFormat,
    /// CSV consumption strategy. Always [`ParseStrategy::WholeFile`] for spreadsheets.
    pub strategy: ParseStrategy,
}

/// Choose a parser for `file_name` of `byte_size` bytes using the default large-file threshold.
pub fn detect_format(file_name: &str, byte_size: u64) -> IngestionResult<FormatDecision> {
    detect_format_with_threshold(file_name, byte_size, LARGE_FILE_THRESHOLD)
}

/// Like [`detect_format`] with an explicit large-file threshold.
pub fn detect_format_with_threshold(
    file_name: &str,
    byte_size: u64,
    large_file_threshold: u64,
) -> IngestionResult<FormatDecision> {
    let format = detect_file_format(file_name)?;
    Ok(FormatDecision {
        format,
        strategy: ParseStrategy::for_size(format, byte_size, large_file_threshold),
    })
}

/// The format half of [`detect_format`]; needs only the name, so it can run before any I/O.
pub fn detect_file_format(file_name: &str) -> IngestionResult<FileFormat> {
    let ext = extension_of(file_name);
    FileFormat::from_extension(ext).ok_or_else(|| IngestionError::FileFormat {
        extension: ext.to_ascii_lowercase(),
    })
}

/// Extension of `file_name` without the dot, or `""` if there is none.
pub(crate) fn extension_of(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
}
