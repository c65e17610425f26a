//! Progress reporting and cancellation for a single parse.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{IngestionError, IngestionResult};

/// Progress callback receiving the consumed fraction of the input in `[0, 1]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Cooperative cancellation flag shared between a caller and a running parse.
///
/// Parsers check it between records; once set, the parse stops with
/// [`IngestionError::Cancelled`] and its partial rows are dropped.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-parse hooks: optional progress callback and optional cancellation token.
#[derive(Clone, Default)]
pub struct ParseControl {
    progress: Option<ProgressCallback>,
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for ParseControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseControl")
            .field("progress_set", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

impl ParseControl {
    /// Control with no progress callback and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn check_cancelled(&self) -> IngestionResult<()> {
        if self.is_cancelled() {
            Err(IngestionError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn tracker(&self) -> ProgressTracker<'_> {
        ProgressTracker {
            callback: self.progress.as_ref(),
            last: 0.0,
        }
    }
}

/// Clamps and de-duplicates progress so callers only ever see increasing values.
pub(crate) struct ProgressTracker<'a> {
    callback: Option<&'a ProgressCallback>,
    last: f64,
}

impl ProgressTracker<'_> {
    pub(crate) fn report(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if fraction <= self.last {
            return;
        }
        self.last = fraction;
        if let Some(cb) = self.callback {
            cb(fraction);
        }
    }

    pub(crate) fn report_bytes(&mut self, consumed: u64, total: u64) {
        if total > 0 {
            self.report(consumed as f64 / total as f64);
        }
    }

    pub(crate) fn finish(&mut self) {
        if self.last < 1.0 {
            self.last = 1.0;
            if let Some(cb) = self.callback {
                cb(1.0);
            }
        }
    }
}
