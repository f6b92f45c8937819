//! State module for tracking batch progress and results
//!
//! # Components
//!
//! - `ProgressState`: Pollable processed/total counters for a running batch
//! - `ProgressSink`: Callback interface the coordinator reports through
//! - `SiteResult` / `BatchResult`: Extraction outcomes returned to the caller

mod progress;
mod result;

// Re-export main types
pub use progress::{NoProgress, ProgressSink, ProgressSnapshot, ProgressState};
pub use result::{BatchResult, SiteResult};
