//! Batch progress reporting
//!
//! The coordinator reports progress through [`ProgressSink`] once per site.
//! [`ProgressState`] is the sink an external poller reads from: it is shared
//! behind an `Arc` and every update is visible as soon as it is made.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Receives `(processed, total)` after each site's result is recorded
///
/// Called synchronously from the batch task, so implementations must be cheap.
pub trait ProgressSink: Send + Sync {
    /// Called once with the batch size before the first site starts
    fn on_start(&self, _total: usize) {}

    fn on_progress(&self, processed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

/// Sink that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _processed: usize, _total: usize) {}
}

/// Pollable progress counters for one batch
#[derive(Debug, Default)]
pub struct ProgressState {
    processed: AtomicUsize,
    total: AtomicUsize,
    error: Mutex<Option<String>>,
}

/// Point-in-time view of a [`ProgressState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub error: Option<String>,
    pub percentage: u8,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the counters for a batch of `total` sites
    pub fn begin(&self, total: usize) {
        self.processed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Records a batch-level failure for pollers
    pub fn fail(&self, message: impl Into<String>) {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Returns true once every site has been accounted for
    pub fn is_complete(&self) -> bool {
        let total = self.total();
        total > 0 && self.processed() >= total
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let processed = self.processed();
        let total = self.total();
        ProgressSnapshot {
            processed,
            total,
            error: self
                .error
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            percentage: percentage(processed, total),
        }
    }
}

impl ProgressSink for ProgressState {
    fn on_start(&self, total: usize) {
        self.begin(total);
    }

    fn on_progress(&self, processed: usize, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        // Never move backwards if a stale update arrives late
        self.processed.fetch_max(processed.min(total), Ordering::SeqCst);
    }
}

/// Rounded completion percentage, 0 when nothing is scheduled
fn percentage(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round();
    pct.min(100.0) as u8
}
