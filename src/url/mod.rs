//! URL handling module for Contact-Harvest
//!
//! This module provides site address normalization and host extraction for
//! report rendering.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::report_domain;
pub use normalize::normalize_url;
