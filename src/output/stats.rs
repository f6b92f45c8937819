//! Batch statistics
//!
//! Summarizes a finished batch for the end-of-run printout.

use crate::state::BatchResult;

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStatistics {
    /// Number of sites in the batch
    pub total_sites: usize,

    /// Sites where at least one email was found
    pub sites_with_emails: usize,

    /// Sites that were reachable but had no email
    pub sites_without_emails: usize,

    /// Sites recorded with an error
    pub failed_sites: usize,

    /// Distinct addresses across the whole batch
    pub unique_emails: usize,
}

impl BatchStatistics {
    /// Computes statistics from a batch result
    pub fn from_results(results: &BatchResult) -> Self {
        let mut stats = BatchStatistics {
            total_sites: results.len(),
            unique_emails: results.unique_emails().len(),
            ..Default::default()
        };

        for site in results {
            if site.is_error() {
                stats.failed_sites += 1;
            } else if site.emails.is_empty() {
                stats.sites_without_emails += 1;
            } else {
                stats.sites_with_emails += 1;
            }
        }

        stats
    }

    /// Share of sites that yielded at least one email, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.total_sites == 0 {
            return 0.0;
        }
        (self.sites_with_emails as f64 / self.total_sites as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Extraction Statistics ===\n");

    println!("Sites:");
    println!("  Processed: {}", stats.total_sites);
    println!("  With emails: {}", stats.sites_with_emails);
    println!("  Without emails: {}", stats.sites_without_emails);
    println!("  Failed: {}", stats.failed_sites);
    println!();

    println!("Unique emails found: {}", stats.unique_emails);
    println!(
        "Hit Rate: {:.1}% ({} / {} sites with emails)",
        stats.hit_rate(),
        stats.sites_with_emails,
        stats.total_sites
    );
}
