//! Outcome reporting for uploads.
//!
//! The unified entry points call an [`IngestionObserver`] once per upload: `on_success` with
//! row/column counts, or `on_failure` with a severity derived from the error kind, followed by
//! `on_alert` when that severity reaches [`crate::ingestion::IngestionOptions::alert_at_or_above`].

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::IngestionError;

use super::format::FileFormat;

/// How bad a failed upload is. Ordered, so it can be compared against an alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Not a failure; reserved for hosts that report their own notices.
    Info,
    /// The caller cancelled the parse.
    Warning,
    /// Wrong file type, too large, or a corrupt file.
    Error,
    /// The bytes could not be read at all.
    Critical,
}

/// Which upload an outcome belongs to.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// File name or path of the upload.
    pub source: String,
    /// Parser family, or `None` when the extension was rejected before one was chosen.
    pub format: Option<FileFormat>,
}

/// Shape of a successfully parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Data rows, header excluded.
    pub rows: usize,
    /// Header count.
    pub columns: usize,
}

/// Receives the outcome of every upload passed through the unified entry points.
///
/// All methods default to doing nothing, so an upload dashboard can implement only
/// `on_success` and a pager only `on_alert`.
pub trait IngestionObserver: Send + Sync {
    /// The upload parsed into a table.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// The upload was rejected, could not be read or parsed, or was cancelled.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// A failure at or above the alert threshold. Runs after `on_failure` for the same error.
    ///
    /// Forwards to [`Self::on_failure`] unless overridden, so a failure-only observer sees
    /// alerting failures twice.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every outcome to each wrapped observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Wrap `observers`; callbacks reach them in vector order.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion outcomes as structured `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            source = %ctx.source,
            format = ?ctx.format,
            rows = stats.rows,
            columns = stats.columns,
            "ingestion succeeded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        match severity {
            IngestionSeverity::Info | IngestionSeverity::Warning => warn!(
                source = %ctx.source,
                format = ?ctx.format,
                ?severity,
                kind = ?error.kind(),
                %error,
                "ingestion stopped"
            ),
            IngestionSeverity::Error | IngestionSeverity::Critical => error!(
                source = %ctx.source,
                format = ?ctx.format,
                ?severity,
                kind = ?error.kind(),
                %error,
                "ingestion failed"
            ),
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(
            source = %ctx.source,
            format = ?ctx.format,
            ?severity,
            kind = ?error.kind(),
            %error,
            alert = true,
            "ingestion alert"
        );
    }
}
