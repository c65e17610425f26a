use std::fmt;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Why a pre-flight [`IngestionError::Validation`] rejected an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// The file is larger than the configured ceiling.
    TooLarge,
    /// The file name does not end in an accepted extension.
    UnsupportedExtension,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => f.write_str("too large"),
            Self::UnsupportedExtension => f.write_str("unsupported extension"),
        }
    }
}

/// Coarse error category, stable across wording changes.
///
/// UIs branch on this to tell "wrong file type", "unreadable/corrupt" and "too large" apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported file extension detected while choosing a parser.
    FileFormat,
    /// I/O or decoding failure while reading raw bytes.
    FileRead,
    /// Structural failure inside the CSV tokenizer or the workbook reader.
    Parse,
    /// Pre-flight rejection (size ceiling, extension allow-list).
    Validation,
    /// The caller cancelled the parse.
    Cancelled,
}

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across format detection, CSV and (optional) Excel
/// parsing. Every variant is fatal to the current parse attempt; nothing is retried and no
/// partially populated table is returned.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The file extension is not one of `.csv`, `.xlsx`, `.xls`.
    #[error("unsupported file format: '{extension}'")]
    FileFormat { extension: String },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("file read error: {0}")]
    FileRead(#[from] std::io::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Workbook error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Structural failure not covered by the tokenizer errors above.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Pre-flight validation failure, raised before any parsing.
    #[error("validation failed ({reason}): {message}")]
    Validation {
        reason: ValidationReason,
        message: String,
    },

    /// The parse was cancelled through its [`crate::ingestion::CancellationToken`].
    #[error("ingestion cancelled")]
    Cancelled,
}

impl IngestionError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileFormat { .. } => ErrorKind::FileFormat,
            Self::FileRead(_) => ErrorKind::FileRead,
            Self::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => ErrorKind::FileRead,
                _ => ErrorKind::Parse,
            },
            #[cfg(feature = "excel")]
            Self::Excel(calamine::Error::Io(_)) => ErrorKind::FileRead,
            #[cfg(feature = "excel")]
            Self::Excel(_) => ErrorKind::Parse,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// One human-readable sentence suitable for showing to the uploader.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileFormat { extension } if extension.is_empty() => {
                "Unsupported file type: the file has no extension. Upload a CSV or Excel file."
                    .to_string()
            }
            Self::FileFormat { extension } => format!(
                "Unsupported file type '.{extension}'. Upload a CSV or Excel (.xlsx, .xls) file."
            ),
            Self::Validation {
                reason: ValidationReason::TooLarge,
                message,
            } => format!("The file is too large: {message}."),
            Self::Validation {
                reason: ValidationReason::UnsupportedExtension,
                ..
            } => "Unsupported file type. Only CSV and Excel (.xlsx, .xls) files are accepted."
                .to_string(),
            Self::Cancelled => "The upload was cancelled.".to_string(),
            other => match other.kind() {
                ErrorKind::FileRead => format!("The file could not be read: {other}."),
                _ => format!("The file appears to be corrupt or malformed: {other}."),
            },
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
