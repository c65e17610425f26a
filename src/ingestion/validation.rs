//! Pre-flight upload checks that run before any parsing.

use crate::error::{IngestionError, IngestionResult, ValidationReason};

use super::format::{FileFormat, extension_of};

/// Size ceiling applied at the upload boundary by UI callers.
pub const UPLOAD_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Sanity ceiling applied by [`crate::ingestion::IngestionOptions`] by default.
pub const SANITY_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

/// Reject uploads that are too large or do not carry an accepted extension.
///
/// Size is checked first, so an oversized file with a bad extension reports
/// [`ValidationReason::TooLarge`].
pub fn validate_upload(file_name: &str, byte_size: u64, max_bytes: u64) -> IngestionResult<()> {
    validate_size(file_name, byte_size, max_bytes)?;

    let ext = extension_of(file_name);
    if FileFormat::from_extension(ext).is_none() {
        return Err(IngestionError::Validation {
            reason: ValidationReason::UnsupportedExtension,
            message: format!("'{file_name}' is not a .csv, .xlsx or .xls file"),
        });
    }
    Ok(())
}

/// Reject uploads larger than `max_bytes`, whatever their name.
pub fn validate_size(file_name: &str, byte_size: u64, max_bytes: u64) -> IngestionResult<()> {
    if byte_size > max_bytes {
        return Err(IngestionError::Validation {
            reason: ValidationReason::TooLarge,
            message: format!(
                "{} is {} bytes, limit is {} MiB",
                file_name,
                byte_size,
                max_bytes / (1024 * 1024)
            ),
        });
    }
    Ok(())
}
