//! Report rendering
//!
//! Turns a [`BatchResult`] into a downloadable file in one of three layouts:
//! one CSV row per site, one CSV row per email address, or the raw JSON
//! mapping.

use crate::state::BatchResult;
use crate::url::report_domain;
use crate::HarvestError;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Row written for a site without any email address
pub const NO_EMAILS_PLACEHOLDER: &str = "No emails found";

/// Layout of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `Domain, Emails`: one row per site, emails joined with ", "
    #[default]
    Domains,

    /// `Website URL, Email Address`: one row per email
    Rows,

    /// URL-keyed JSON object
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Domains | ReportFormat::Rows => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domains" => Ok(ReportFormat::Domains),
            "rows" => Ok(ReportFormat::Rows),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{}' (expected domains, rows or json)",
                other
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Domains => "domains",
            ReportFormat::Rows => "rows",
            ReportFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// Default file name for a report written at `now`
///
/// # Example
///
/// ```
/// use chrono::{Local, TimeZone};
/// use contact_harvest::output::{default_report_name, ReportFormat};
///
/// let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 30).unwrap();
/// assert_eq!(
///     default_report_name(now, ReportFormat::Domains),
///     "extracted_emails_2024-03-09_14-05-30.csv"
/// );
/// ```
pub fn default_report_name(now: DateTime<Local>, format: ReportFormat) -> String {
    format!(
        "extracted_emails_{}.{}",
        now.format("%Y-%m-%d_%H-%M-%S"),
        format.extension()
    )
}

/// Writes `results` to `writer` in the given layout
pub fn write_report<W: Write>(
    results: &BatchResult,
    format: ReportFormat,
    writer: W,
) -> Result<(), HarvestError> {
    match format {
        ReportFormat::Domains => write_domain_report(results, writer),
        ReportFormat::Rows => write_email_rows(results, writer),
        ReportFormat::Json => write_json_report(results, writer),
    }
}

/// Writes a report file, creating or truncating `path`
pub fn save_report(
    results: &BatchResult,
    format: ReportFormat,
    path: &Path,
) -> Result<(), HarvestError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_report(results, format, &mut writer)?;
    writer.flush()?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

/// One row per site: its host and every email joined with ", "
pub fn write_domain_report<W: Write>(results: &BatchResult, writer: W) -> Result<(), HarvestError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Domain", "Emails"])?;

    for site in results {
        let emails: Vec<&str> = site.emails.iter().map(String::as_str).collect();
        csv.write_record([report_domain(&site.url), emails.join(", ")])?;
    }

    csv.flush()?;
    Ok(())
}

/// One row per (site, email) pair, with a placeholder row for empty sites
pub fn write_email_rows<W: Write>(results: &BatchResult, writer: W) -> Result<(), HarvestError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Website URL", "Email Address"])?;

    for site in results {
        if site.emails.is_empty() {
            csv.write_record([site.url.as_str(), NO_EMAILS_PLACEHOLDER])?;
            continue;
        }
        for email in &site.emails {
            csv.write_record([site.url.as_str(), email.as_str()])?;
        }
    }

    csv.flush()?;
    Ok(())
}

/// Pretty-printed JSON object keyed by site URL
pub fn write_json_report<W: Write>(results: &BatchResult, mut writer: W) -> Result<(), HarvestError> {
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.write_all(b"\n")?;
    Ok(())
}
