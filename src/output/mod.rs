//! Output module for writing extraction reports
//!
//! This module handles:
//! - Rendering batch results as CSV or JSON reports
//! - Naming report files
//! - Summarizing batch statistics

mod report;
pub mod stats;

pub use report::{
    default_report_name, save_report, write_domain_report, write_email_rows, write_json_report,
    write_report, ReportFormat, NO_EMAILS_PLACEHOLDER,
};
pub use stats::{print_statistics, BatchStatistics};
