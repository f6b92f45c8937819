//! Configuration module for Contact-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a configuration file is valid.
//!
//! # Example
//!
//! ```no_run
//! use contact_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Probing {} candidate pages per site", config.pages.candidates.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, FetchConfig, PagesConfig, RendererConfig, DEFAULT_CANDIDATE_PAGES,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
