//! Run statistics
//!
//! Counters accumulated by the coordinator during a crawl and logged as a
//! summary when the run ends.

use crate::crawler::TraversalStats;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run ended, once finished
    pub finished_at: Option<DateTime<Utc>>,

    /// Container pages yielded by the traversal
    pub pages_yielded: u64,

    /// Failed page fetches that were rescheduled
    pub page_retries: u64,

    /// Pages dropped after exhausting their retries
    pub pages_abandoned: u64,

    /// Leaves attempted, successful or not
    pub leaves_attempted: u64,

    /// Leaves skipped because resolution, download or inspection failed
    pub leaves_failed: u64,

    /// Archive entries written to the sink
    pub entries_written: u64,

    /// True when the run stopped on the item budget rather than an empty frontier
    pub budget_exhausted: bool,
}

impl CrawlStats {
    /// Creates empty statistics stamped with the current time
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_yielded: 0,
            page_retries: 0,
            pages_abandoned: 0,
            leaves_attempted: 0,
            leaves_failed: 0,
            entries_written: 0,
            budget_exhausted: false,
        }
    }

    /// Copies the traversal counters and stamps the finish time
    pub fn finish(&mut self, traversal: TraversalStats) {
        self.pages_yielded = traversal.pages_yielded;
        self.page_retries = traversal.retries;
        self.pages_abandoned = traversal.pages_abandoned;
        self.finished_at = Some(Utc::now());
    }

    /// Leaves that produced a readable archive
    pub fn leaves_succeeded(&self) -> u64 {
        self.leaves_attempted.saturating_sub(self.leaves_failed)
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Returns the leaf success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.leaves_attempted == 0 {
            return 0.0;
        }
        (self.leaves_succeeded() as f64 / self.leaves_attempted as f64) * 100.0
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs statistics as a run summary
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn log_statistics(stats: &CrawlStats) {
    tracing::info!("=== Crawl Statistics ===");
    tracing::info!("Started: {}", stats.started_at.to_rfc3339());
    if let Some(duration) = stats.duration_seconds() {
        tracing::info!("Duration: {}s", duration);
    }

    tracing::info!(
        "Pages: {} crawled, {} retries, {} abandoned",
        stats.pages_yielded,
        stats.page_retries,
        stats.pages_abandoned
    );
    tracing::info!(
        "Leaves: {} attempted, {} failed ({:.1}% success)",
        stats.leaves_attempted,
        stats.leaves_failed,
        stats.success_rate()
    );
    tracing::info!("Entries written: {}", stats.entries_written);

    if stats.budget_exhausted {
        tracing::info!("Stopped after reaching the item budget");
    } else {
        tracing::info!("Stopped after exhausting the frontier");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = CrawlStats::new();
        assert_eq!(stats.leaves_attempted, 0);
        assert!(stats.finished_at.is_none());
        assert_eq!(stats.duration_seconds(), None);
    }

    #[test]
    fn test_success_rate() {
        let mut stats = CrawlStats::new();
        stats.leaves_attempted = 10;
        stats.leaves_failed = 2;

        assert_eq!(stats.leaves_succeeded(), 8);
        assert!((stats.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_leaves() {
        assert_eq!(CrawlStats::new().success_rate(), 0.0);
    }

    #[test]
    fn test_finish_copies_traversal_counters() {
        let mut stats = CrawlStats::new();
        stats.finish(TraversalStats {
            pages_yielded: 5,
            retries: 2,
            pages_abandoned: 1,
            depth_cutoffs: 7,
        });

        assert_eq!(stats.pages_yielded, 5);
        assert_eq!(stats.page_retries, 2);
        assert_eq!(stats.pages_abandoned, 1);
        assert!(stats.duration_seconds().unwrap() >= 0);
    }
}
