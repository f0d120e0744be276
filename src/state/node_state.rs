//! Fetch-state definitions for container pages and download targets
//!
//! Both state machines only move forward; see the `can_transition_to` methods.

use std::fmt;

/// Represents the current state of a container page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    // ===== Active States =====
    /// Page has been discovered and queued, but not fetched successfully yet
    Pending,

    /// Page body has been fetched and is held until links are extracted
    Fetched,

    // ===== Terminal States =====
    /// Links have been extracted and the body has been released
    LinksExtracted,

    /// Page failed more times than the retry ceiling allows
    Abandoned,
}

impl NodeState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LinksExtracted | Self::Abandoned)
    }

    /// Returns true if the state machine permits moving to `next`
    ///
    /// `Pending → Fetched → LinksExtracted`, and `Pending → Abandoned`.
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetched)
                | (Self::Pending, Self::Abandoned)
                | (Self::Fetched, Self::LinksExtracted)
        )
    }

    /// Returns the lowercase name of the state, used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::LinksExtracted => "links_extracted",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current state of a download target
///
/// Exactly one state per stage; an identifier must be resolved before the
/// payload is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafState {
    /// Created from a leaf-link, nothing fetched yet
    Initialized,

    /// Download identifier has been extracted from the leaf page
    Resolved,

    /// Payload has been downloaded and handed out for inspection
    Downloaded,
}

impl LeafState {
    /// Returns true if the state machine permits moving to `next`
    pub fn can_transition_to(&self, next: LeafState) -> bool {
        matches!(
            (self, next),
            (Self::Initialized, Self::Resolved) | (Self::Resolved, Self::Downloaded)
        )
    }

    /// Returns the lowercase name of the state, used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Resolved => "resolved",
            Self::Downloaded => "downloaded",
        }
    }
}

impl fmt::Display for LeafState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
