//! URL handling module for Catalog Crawler
//!
//! This module is the link classifier: it resolves raw hrefs, decides whether
//! they belong to the crawled site, normalizes them into canonical paths and
//! splits in-scope paths into container pages and download targets.

mod matcher;
mod normalize;

use crate::config::SiteConfig;
use crate::{ConfigError, UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use matcher::matches_wildcard;
pub use normalize::{canonical_path, resolve_href};

/// Classification of a single hyperlink
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// A catalog page that may contain further links
    Container(String),
    /// A download-initiation page for a single package
    Leaf(String),
    /// Foreign host, disallowed prefix, or malformed link
    OutOfScope,
}

impl LinkClass {
    /// Returns the canonical path for in-scope links
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Container(path) | Self::Leaf(path) => Some(path),
            Self::OutOfScope => None,
        }
    }

    /// Returns true if the link should be ignored
    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, Self::OutOfScope)
    }
}

/// The crawled site, resolved from configuration
///
/// Owns everything needed to classify links and to build absolute URLs for
/// pages and download handlers.
#[derive(Debug, Clone)]
pub struct SiteScope {
    base: Url,
    extra_hosts: Vec<String>,
    allowed_prefixes: Vec<String>,
    leaf_suffix: String,
    download_handler_path: String,
    download_id_param: String,
}

impl SiteScope {
    /// Builds the scope from site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        let base = config
            .base_url()
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site '{}': {}", config.host, e)))?;

        Ok(Self {
            base,
            extra_hosts: config
                .extra_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            allowed_prefixes: config.allowed_prefixes.clone(),
            leaf_suffix: config.leaf_suffix.clone(),
            download_handler_path: config.download_handler_path.clone(),
            download_id_param: config.download_id_param.clone(),
        })
    }

    /// Returns the site root URL
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds the absolute URL of a canonical path on this site
    pub fn absolute_url(&self, path: &str) -> UrlResult<Url> {
        self.base
            .join(path)
            .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))
    }

    /// Builds the payload URL for a resolved download identifier
    pub fn download_url(&self, download_id: u64) -> UrlResult<Url> {
        let mut url = self.absolute_url(&self.download_handler_path)?;
        url.query_pairs_mut()
            .clear()
            .append_pair(&self.download_id_param, &download_id.to_string());
        Ok(url)
    }

    /// Returns true if the URL points at the configured host or an extra host
    pub fn is_same_site(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        if Some(host.as_str()) == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
        {
            return true;
        }

        self.extra_hosts
            .iter()
            .any(|pattern| matches_wildcard(pattern, &host))
    }

    /// Returns true if the canonical path starts with an allowed prefix
    pub fn is_allowed_path(&self, path: &str) -> bool {
        self.allowed_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Returns true if the canonical path is a download-initiation page
    pub fn is_leaf_path(&self, path: &str) -> bool {
        path.ends_with(self.leaf_suffix.as_str())
    }
}

/// Classifies a raw hyperlink found on a page
///
/// This is a pure function of its inputs:
/// 1. Resolve the href against the current page; malformed → OutOfScope
/// 2. Foreign host → OutOfScope (path-only links are always same-host)
/// 3. Drop query and fragment, canonicalize the path
/// 4. Path outside the allowed prefixes → OutOfScope
/// 5. Path ending with the leaf suffix → Leaf, otherwise → Container
///
/// # Arguments
///
/// * `href` - The raw `href` attribute value
/// * `current_path` - Canonical path of the page the link was found on
/// * `scope` - The site scope policy
///
/// # Examples
///
/// ```
/// use catalog_crawler::config::SiteConfig;
/// use catalog_crawler::url::{classify_link, LinkClass, SiteScope};
///
/// let site = SiteConfig {
///     scheme: "https".to_string(),
///     host: "www.example.com".to_string(),
///     extra_hosts: vec![],
///     allowed_prefixes: vec!["/apk".to_string()],
///     leaf_suffix: "/download/".to_string(),
///     download_handler_path: "/download.php".to_string(),
///     download_id_param: "id".to_string(),
/// };
/// let scope = SiteScope::from_config(&site).unwrap();
///
/// assert_eq!(
///     classify_link("app/download/", "/apk/vendor/", &scope),
///     LinkClass::Leaf("/apk/vendor/app/download/".to_string())
/// );
/// assert_eq!(
///     classify_link("https://other.com/apk/", "/apk/", &scope),
///     LinkClass::OutOfScope
/// );
/// ```
pub fn classify_link(href: &str, current_path: &str, scope: &SiteScope) -> LinkClass {
    let page_url = match scope.absolute_url(current_path) {
        Ok(url) => url,
        Err(e) => {
            tracing::trace!("Cannot resolve current page {}: {}", current_path, e);
            return LinkClass::OutOfScope;
        }
    };

    let target = match resolve_href(href, &page_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::trace!("Ignoring link {:?}: {}", href, e);
            return LinkClass::OutOfScope;
        }
    };

    if !scope.is_same_site(&target) {
        return LinkClass::OutOfScope;
    }

    let path = canonical_path(target.path());

    if !scope.is_allowed_path(&path) {
        return LinkClass::OutOfScope;
    }

    if scope.is_leaf_path(&path) {
        LinkClass::Leaf(path)
    } else {
        LinkClass::Container(path)
    }
}
