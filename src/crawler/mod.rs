//! Crawler module for catalog traversal and package download
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through proxies with rotating headers
//! - HTML parsing for links and download identifiers
//! - Container pages and the traversal engine that walks them
//! - Two-phase leaf resolution
//! - Overall crawl coordination

mod coordinator;
mod engine;
mod fetcher;
mod leaf;
mod node;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use engine::{Traversal, TraversalStats};
pub use fetcher::{base_headers, build_http_client, FetchedDocument, Fetcher, HttpFetcher};
pub use leaf::LeafTarget;
pub use node::ContainerNode;
pub use parser::{extract_candidate_links, extract_shortlink, parse_shortlink_id};

use crate::config::Config;
use crate::output::CrawlStats;
use crate::CrawlerError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the entries file for appending
/// 2. Build the HTTP fetcher and site scope
/// 3. Walk the catalog from the root path
/// 4. Download and inspect every leaf until the item budget is spent
/// 5. Log a statistics summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed
/// * `Err(CrawlerError)` - Crawl could not start or output failed
pub async fn crawl(config: Config) -> Result<CrawlStats, CrawlerError> {
    run_crawl(config).await
}
