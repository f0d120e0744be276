//! Catalog Crawler: a package catalog walker
//!
//! This crate crawls a hierarchical web catalog of downloadable application
//! packages, resolves every download target it discovers, and catalogues the
//! contents of each downloaded archive without keeping the archive around.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-page and per-leaf failures never reach this type; they are contained
/// by the traversal engine and the leaf resolver.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
///
/// These never leave the link classifier: a link that fails to resolve is
/// simply out of scope.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failure to retrieve a document from the site
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Failure to turn a leaf-link into a downloaded payload
#[derive(Debug, Error)]
pub enum LeafError {
    #[error("Download identifier not found on {path}: {reason}")]
    IdentifierNotFound { path: String, reason: String },

    #[error("Download failed for {url}: {source}")]
    Download { url: String, source: FetchError },

    #[error("Failed to buffer payload: {0}")]
    Payload(#[from] std::io::Error),
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use archive::{infer_media_type, ArchiveEntry};
pub use config::Config;
pub use crawler::{ContainerNode, Coordinator, Traversal};
pub use state::{LeafState, NodeState};
pub use url::{classify_link, LinkClass};
