//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator is the consumer side of the traversal: it pulls container
//! pages from the engine, drives every leaf-link on them through the leaf
//! resolver and the archive inspector, and writes the resulting entries to a
//! sink. It owns the item budget; the engine knows nothing about it.

use crate::archive::{ArchiveEntries, ArchiveError};
use crate::config::Config;
use crate::crawler::engine::Traversal;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::leaf::LeafTarget;
use crate::output::{log_statistics, CrawlStats, EntrySink, LineWriter};
use crate::url::SiteScope;
use crate::{CrawlerError, LeafError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a leaf produced no (or only some) entries
#[derive(Debug, Error)]
enum LeafSkip {
    #[error(transparent)]
    Leaf(#[from] LeafError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Main crawler coordinator structure
pub struct Coordinator<F: Fetcher + ?Sized = HttpFetcher> {
    config: Arc<Config>,
    fetcher: Arc<F>,
    scope: Arc<SiteScope>,
}

impl Coordinator<HttpFetcher> {
    /// Creates a coordinator that talks to the configured site over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlerError)` - Invalid site settings or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self, CrawlerError> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let fetcher = HttpFetcher::new(&config.http, timeout)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }
}

impl<F: Fetcher + ?Sized> Coordinator<F> {
    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<F>) -> Result<Self, CrawlerError> {
        let scope = SiteScope::from_config(&config.site)?;
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            scope: Arc::new(scope),
        })
    }

    /// Runs the main crawl loop
    ///
    /// Pulls pages until the frontier is exhausted or `max-items` leaves have
    /// been attempted, whichever comes first. Failed leaves are logged and
    /// skipped; only sink errors abort the run.
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination for archive entries
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Counters for the completed run
    /// * `Err(CrawlerError)` - The sink failed
    pub async fn run<S>(&self, sink: &mut S) -> Result<CrawlStats, CrawlerError>
    where
        S: EntrySink + ?Sized,
    {
        let crawler = &self.config.crawler;
        tracing::info!(
            "Starting crawl of {} at {} (max depth {}, max items {})",
            self.scope.base_url(),
            crawler.root_path,
            crawler.max_depth,
            crawler.max_items
        );

        let budget = crawler.max_items as u64;
        let mut stats = CrawlStats::new();
        let mut traversal = Traversal::new(self.fetcher.clone(), self.scope.clone(), crawler);
        let start_time = Instant::now();

        'crawl: while let Some(node) = traversal.next_node().await {
            for leaf_path in node.leaf_links() {
                stats.leaves_attempted += 1;
                self.process_leaf(leaf_path, sink, &mut stats).await?;

                if stats.leaves_attempted >= budget {
                    tracing::info!("Item budget of {} reached", budget);
                    stats.budget_exhausted = true;
                    break 'crawl;
                }
            }

            let pages = traversal.stats().pages_yielded;
            if pages % 10 == 0 {
                let rate = pages as f64 / start_time.elapsed().as_secs_f64().max(0.001);
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {} leaves attempted, {:.2} pages/sec",
                    pages,
                    traversal.frontier_len(),
                    stats.leaves_attempted,
                    rate
                );
            }
        }

        if !stats.budget_exhausted {
            tracing::info!("Frontier is empty, crawl complete");
        }

        // Dropping the traversal here releases anything still in flight
        stats.finish(traversal.stats());
        sink.flush()?;

        tracing::info!(
            "Crawl completed: {} pages, {} entries in {:?}",
            stats.pages_yielded,
            stats.entries_written,
            start_time.elapsed()
        );

        Ok(stats)
    }

    /// Downloads one leaf and writes its entries
    ///
    /// Leaf failures are counted and logged here; only sink errors escape.
    async fn process_leaf<S>(
        &self,
        path: &str,
        sink: &mut S,
        stats: &mut CrawlStats,
    ) -> Result<(), CrawlerError>
    where
        S: EntrySink + ?Sized,
    {
        let entries = match self.open_leaf(path).await {
            Ok(entries) => entries,
            Err(e) => {
                stats.leaves_failed += 1;
                tracing::warn!("Skipping leaf {}: {}", path, e);
                return Ok(());
            }
        };

        let mut written = 0;
        for entry in entries {
            match entry {
                Ok(entry) => {
                    sink.write_entry(&entry)?;
                    written += 1;
                }
                Err(e) => {
                    stats.leaves_failed += 1;
                    tracing::warn!(
                        "Archive for {} is unreadable after {} entries: {}",
                        path,
                        written,
                        e
                    );
                    break;
                }
            }
        }

        stats.entries_written += written;
        tracing::debug!("{}: wrote {} entries", path, written);
        Ok(())
    }

    async fn open_leaf(&self, path: &str) -> Result<ArchiveEntries, LeafSkip> {
        let mut leaf = LeafTarget::new(path);
        let payload = leaf.fetch(self.fetcher.as_ref(), &self.scope).await?;
        let entries = payload.into_entries(&self.config.output.unknown_media_type)?;
        Ok(entries)
    }
}

/// Runs a complete crawl and appends entries to the configured file
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed
/// * `Err(CrawlerError)` - Setup failed or the output file could not be written
pub async fn run_crawl(config: Config) -> Result<CrawlStats, CrawlerError> {
    let mut sink = LineWriter::append_to_path(&config.output.entries_path)?;
    let coordinator = Coordinator::new(config)?;

    let stats = coordinator.run(&mut sink).await?;
    log_statistics(&stats);
    Ok(stats)
}
