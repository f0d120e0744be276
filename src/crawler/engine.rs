//! Traversal engine - the frontier walk over container pages
//!
//! The engine owns the frontier, the visited sets and the depth / retry
//! policy. It produces container pages one at a time through
//! [`Traversal::next_node`], a pull-based step function, or as a lazy stream
//! through [`Traversal::into_stream`].
//!
//! # Frontier policy
//!
//! - Newly discovered children are pushed to the **front** of the frontier,
//!   giving fresh exploration a depth-first bias.
//! - Pages being retried are pushed to the **back**, behind fresh work.
//! - A path enters the visited set when its node is created, not when it is
//!   fetched, so no path is ever queued twice.
//! - Leaf-links are deduplicated across the whole run; each leaf path is
//!   handed out by at most one yielded node.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::node::ContainerNode;
use crate::url::{canonical_path, SiteScope};
use futures::stream::{self, Stream};
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Counters describing what the engine has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes handed to the consumer
    pub pages_yielded: u64,
    /// Failed fetches that were rescheduled
    pub retries: u64,
    /// Nodes dropped after exhausting their retries
    pub pages_abandoned: u64,
    /// Child links not queued because they would exceed the depth ceiling
    pub depth_cutoffs: u64,
}

/// Depth-bounded, retry-aware walk over the catalog
pub struct Traversal<F: Fetcher + ?Sized> {
    fetcher: Arc<F>,
    scope: Arc<SiteScope>,
    frontier: VecDeque<ContainerNode>,
    visited_pages: HashSet<String>,
    visited_leaves: HashSet<String>,
    max_depth: u32,
    max_retries: u32,
    retry_delay: Duration,
    stats: TraversalStats,
}

impl<F: Fetcher + ?Sized> Traversal<F> {
    /// Creates an engine whose frontier holds only the root page
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared document fetcher
    /// * `scope` - Site scope used to build URLs and classify links
    /// * `config` - Root path, depth ceiling, retry ceiling and retry delay
    pub fn new(fetcher: Arc<F>, scope: Arc<SiteScope>, config: &CrawlerConfig) -> Self {
        let root = ContainerNode::new(canonical_path(&config.root_path), 0);

        let mut visited_pages = HashSet::new();
        visited_pages.insert(root.path().to_string());

        let mut frontier = VecDeque::new();
        frontier.push_back(root);

        Self {
            fetcher,
            scope,
            frontier,
            visited_pages,
            visited_leaves: HashSet::new(),
            max_depth: config.max_depth,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            stats: TraversalStats::default(),
        }
    }

    /// Produces the next successfully fetched page, or `None` at the end
    ///
    /// Each call pops frontier entries until one fetches successfully:
    /// 1. Empty frontier → end of traversal
    /// 2. Fetch failure below the retry ceiling → retry count +1, back of frontier
    /// 3. Fetch failure at the ceiling → node abandoned, never seen again
    /// 4. Success → links extracted, unseen children within the depth
    ///    ceiling queued at the front, unseen leaves kept on the node
    ///
    /// Dropping the returned future cancels the in-flight fetch; the popped
    /// node is discarded without link extraction.
    pub async fn next_node(&mut self) -> Option<ContainerNode> {
        loop {
            let mut node = self.frontier.pop_front()?;
            tracing::debug!(
                "Crawling page {} (depth {}, attempt {})",
                node.path(),
                node.depth(),
                node.retries() + 1
            );

            if node.retries() > 0 {
                self.wait_before_retry().await;
            }

            if let Err(e) = node.fetch(self.fetcher.as_ref(), &self.scope).await {
                self.handle_failure(node, e);
                continue;
            }

            node.extract_links(&self.scope);
            self.enqueue_children(&node);
            self.claim_leaves(&mut node);

            self.stats.pages_yielded += 1;
            return Some(node);
        }
    }

    /// Turns the engine into a lazy stream of pages
    ///
    /// The stream ends when the frontier is exhausted. Dropping it releases
    /// the engine, including any in-flight fetch.
    pub fn into_stream(self) -> impl Stream<Item = ContainerNode> {
        stream::unfold(self, |mut engine| async move {
            let node = engine.next_node().await?;
            Some((node, engine))
        })
    }

    /// Number of pages waiting to be fetched
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Number of container paths claimed so far (queued, fetched or dropped)
    pub fn visited_count(&self) -> usize {
        self.visited_pages.len()
    }

    /// Number of leaf paths handed out so far
    pub fn visited_leaf_count(&self) -> usize {
        self.visited_leaves.len()
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    fn handle_failure(&mut self, mut node: ContainerNode, error: crate::FetchError) {
        if node.retries() < self.max_retries {
            node.record_retry();
            self.stats.retries += 1;
            tracing::warn!(
                "Failed to fetch {} ({}); rescheduling, retry {}/{}",
                node.path(),
                error,
                node.retries(),
                self.max_retries
            );
            self.frontier.push_back(node);
        } else {
            node.abandon();
            self.stats.pages_abandoned += 1;
            tracing::warn!(
                "Failed to fetch {} ({}); giving up after {} retries",
                node.path(),
                error,
                node.retries()
            );
        }
    }

    /// Queues unseen child pages; depth and visited checks happen together
    fn enqueue_children(&mut self, node: &ContainerNode) {
        let child_depth = node.depth() + 1;
        let mut queued = 0;

        // Reverse so the first link in sorted order ends up at the very front
        for path in node.container_links().iter().rev() {
            if self.visited_pages.contains(path) {
                continue;
            }
            if child_depth > self.max_depth {
                self.stats.depth_cutoffs += 1;
                continue;
            }

            self.visited_pages.insert(path.clone());
            self.frontier.push_front(node.child(path.clone()));
            queued += 1;
        }

        tracing::debug!(
            "{}: queued {} new page(s), frontier size {}",
            node.path(),
            queued,
            self.frontier.len()
        );
    }

    fn claim_leaves(&mut self, node: &mut ContainerNode) {
        let visited = &mut self.visited_leaves;
        node.retain_leaf_links(|path| visited.insert(path.clone()));
        tracing::debug!("{}: {} new leaf link(s)", node.path(), node.leaf_links().len());
    }

    async fn wait_before_retry(&self) {
        if self.retry_delay.is_zero() {
            return;
        }
        // Jitter between 50% and 150% of the configured delay
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        tokio::time::sleep(self.retry_delay.mul_f64(factor)).await;
    }
}
