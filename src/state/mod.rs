//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `NodeState`: Tracks a container page through fetch and link extraction
//! - `LeafState`: Tracks a download target through resolution and download

mod node_state;

// Re-export main types
pub use node_state::{LeafState, NodeState};
