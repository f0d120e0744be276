//! Container pages and their fetch / link-extraction cycle

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_candidate_links;
use crate::state::NodeState;
use crate::url::{classify_link, LinkClass, SiteScope};
use crate::FetchError;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// One discovered catalog page
///
/// Identity is the canonical path: two nodes with the same path are equal
/// regardless of depth or state. The depth is fixed at creation, the retry
/// count only grows, and the link sets are filled exactly once.
#[derive(Debug, Clone)]
pub struct ContainerNode {
    path: String,
    depth: u32,
    state: NodeState,
    retries: u32,
    container_links: BTreeSet<String>,
    leaf_links: BTreeSet<String>,
    document: Option<String>,
}

impl ContainerNode {
    /// Creates a pending node
    pub fn new(path: impl Into<String>, depth: u32) -> Self {
        Self {
            path: path.into(),
            depth,
            state: NodeState::Pending,
            retries: 0,
            container_links: BTreeSet::new(),
            leaf_links: BTreeSet::new(),
            document: None,
        }
    }

    /// Creates the pending node for a child link of this page
    pub fn child(&self, path: impl Into<String>) -> Self {
        Self::new(path, self.depth + 1)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hops from the root page
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Number of failed fetch attempts that were rescheduled
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Container-links discovered on this page
    pub fn container_links(&self) -> &BTreeSet<String> {
        &self.container_links
    }

    /// Leaf-links discovered on this page
    pub fn leaf_links(&self) -> &BTreeSet<String> {
        &self.leaf_links
    }

    /// Returns true while the fetched body is still held
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Fetches the page body
    ///
    /// On success the body is stored and the node moves to `Fetched`.
    /// On failure the node is left untouched; the caller decides whether to
    /// retry or abandon it.
    pub async fn fetch<F>(&mut self, fetcher: &F, scope: &SiteScope) -> Result<(), FetchError>
    where
        F: Fetcher + ?Sized,
    {
        let url = scope
            .absolute_url(&self.path)
            .map_err(|e| FetchError::Transport {
                url: self.path.clone(),
                message: e.to_string(),
            })?;

        let document = fetcher.fetch(&url).await?;

        self.document = Some(document.text());
        self.transition(NodeState::Fetched);
        Ok(())
    }

    /// Classifies every link in the fetched body and releases the body
    ///
    /// # Panics
    ///
    /// Panics if the node is not in the `Fetched` state. Calling this before
    /// a successful fetch, or twice, is a bug in the caller.
    pub fn extract_links(&mut self, scope: &SiteScope) {
        assert_eq!(
            self.state,
            NodeState::Fetched,
            "extract_links called on {} node {}",
            self.state,
            self.path
        );

        let document = self.document.take().unwrap_or_default();

        for href in extract_candidate_links(&document) {
            match classify_link(&href, &self.path, scope) {
                LinkClass::Container(path) => {
                    self.container_links.insert(path);
                }
                LinkClass::Leaf(path) => {
                    self.leaf_links.insert(path);
                }
                LinkClass::OutOfScope => {}
            }
        }

        tracing::trace!(
            "{}: {} container link(s), {} leaf link(s)",
            self.path,
            self.container_links.len(),
            self.leaf_links.len()
        );

        self.transition(NodeState::LinksExtracted);
    }

    /// Records one failed attempt that will be retried
    pub(crate) fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Marks the node as permanently failed
    pub(crate) fn abandon(&mut self) {
        self.transition(NodeState::Abandoned);
    }

    /// Drops leaf-links that were already claimed elsewhere in the run
    pub(crate) fn retain_leaf_links<P>(&mut self, keep: P)
    where
        P: FnMut(&String) -> bool,
    {
        self.leaf_links.retain(keep);
    }

    fn transition(&mut self, next: NodeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {} for {}",
            self.state,
            next,
            self.path
        );
        self.state = next;
    }
}

impl PartialEq for ContainerNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ContainerNode {}

impl Hash for ContainerNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
