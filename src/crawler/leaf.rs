//! Leaf Resolver - two-phase download of a single package
//!
//! Download pages do not link to the package directly. The page advertises a
//! numeric identifier through its shortlink, and the package is served by a
//! separate handler that takes that identifier as a query parameter:
//!
//! 1. [`LeafTarget::resolve_identifier`] fetches the leaf page and reads the
//!    identifier.
//! 2. [`LeafTarget::download_payload`] fetches the handler URL and spools the
//!    response into a temporary file.
//!
//! Leaves are never retried. Any failure in either phase is returned to the
//! caller, which skips the leaf.

use crate::archive::Payload;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{extract_shortlink, parse_shortlink_id};
use crate::state::LeafState;
use crate::url::SiteScope;
use crate::{FetchError, LeafError};
use url::Url;

/// A leaf-link being turned into a downloaded payload
#[derive(Debug, Clone)]
pub struct LeafTarget {
    path: String,
    download_id: Option<u64>,
    archive_name: Option<String>,
    state: LeafState,
}

impl LeafTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            download_id: None,
            archive_name: None,
            state: LeafState::Initialized,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifier read from the leaf page, once resolved
    pub fn download_id(&self) -> Option<u64> {
        self.download_id
    }

    /// Archive file name, once downloaded
    pub fn archive_name(&self) -> Option<&str> {
        self.archive_name.as_deref()
    }

    pub fn state(&self) -> LeafState {
        self.state
    }

    /// Runs both phases and returns the downloaded payload
    pub async fn fetch<F>(&mut self, fetcher: &F, scope: &SiteScope) -> Result<Payload, LeafError>
    where
        F: Fetcher + ?Sized,
    {
        self.resolve_identifier(fetcher, scope).await?;
        self.download_payload(fetcher, scope).await
    }

    /// Phase 1: reads the download identifier from the leaf page
    ///
    /// # Errors
    ///
    /// * `LeafError::Download` - The leaf page could not be fetched
    /// * `LeafError::IdentifierNotFound` - The page has no shortlink, or its
    ///   value is not a number
    pub async fn resolve_identifier<F>(
        &mut self,
        fetcher: &F,
        scope: &SiteScope,
    ) -> Result<u64, LeafError>
    where
        F: Fetcher + ?Sized,
    {
        if let Some(id) = self.download_id {
            return Ok(id);
        }

        let url = scope
            .absolute_url(&self.path)
            .map_err(|e| download_error(&self.path, e.to_string()))?;

        let page = fetcher
            .fetch(&url)
            .await
            .map_err(|source| LeafError::Download {
                url: url.to_string(),
                source,
            })?;

        let shortlink =
            extract_shortlink(&page.text()).ok_or_else(|| LeafError::IdentifierNotFound {
                path: self.path.clone(),
                reason: "no shortlink element".to_string(),
            })?;

        let id = parse_shortlink_id(&shortlink, &page.final_url).map_err(|reason| {
            LeafError::IdentifierNotFound {
                path: self.path.clone(),
                reason,
            }
        })?;

        tracing::debug!("{}: download id {}", self.path, id);
        self.download_id = Some(id);
        self.transition(LeafState::Resolved);
        Ok(id)
    }

    /// Phase 2: downloads the package for the resolved identifier
    ///
    /// The archive name is the last path segment of the final URL, after
    /// redirects. The bytes go straight to a temporary file.
    ///
    /// # Panics
    ///
    /// Panics if called before a successful `resolve_identifier`.
    pub async fn download_payload<F>(
        &mut self,
        fetcher: &F,
        scope: &SiteScope,
    ) -> Result<Payload, LeafError>
    where
        F: Fetcher + ?Sized,
    {
        let id = match (self.state, self.download_id) {
            (LeafState::Resolved, Some(id)) => id,
            _ => panic!(
                "download_payload called on {} leaf {}",
                self.state, self.path
            ),
        };

        let url = scope
            .download_url(id)
            .map_err(|e| download_error(&self.path, e.to_string()))?;

        let response = fetcher
            .fetch(&url)
            .await
            .map_err(|source| LeafError::Download {
                url: url.to_string(),
                source,
            })?;

        let archive_name = archive_name_from_url(&response.final_url)
            .unwrap_or_else(|| format!("download-{}", id));

        let payload = Payload::spool(archive_name.clone(), &response.body)?;
        tracing::debug!(
            "{}: downloaded {} ({} bytes)",
            self.path,
            archive_name,
            response.body.len()
        );

        self.archive_name = Some(archive_name);
        self.transition(LeafState::Downloaded);
        Ok(payload)
    }

    fn transition(&mut self, next: LeafState) {
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

/// Returns the last non-empty path segment of a URL
fn archive_name_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}

fn download_error(path: &str, message: String) -> LeafError {
    LeafError::Download {
        url: path.to_string(),
        source: FetchError::Transport {
            url: path.to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::crawler::fetcher::mock::{document, ScriptedFetcher};

    fn scope() -> SiteScope {
        SiteScope::from_config(&SiteConfig {
            scheme: "https".to_string(),
            host: "www.example.com".to_string(),
            extra_hosts: vec![],
            allowed_prefixes: vec!["/apk".to_string()],
            leaf_suffix: "/download/".to_string(),
            download_handler_path: "/download.php".to_string(),
            download_id_param: "id".to_string(),
        })
        .unwrap()
    }

    fn leaf_page(shortlink: &str) -> String {
        format!(
            r#"<html><head><link rel="shortlink" href="{}" /></head><body></body></html>"#,
            shortlink
        )
    }

    #[tokio::test]
    async fn test_resolve_and_download() {
        let fetcher = ScriptedFetcher::new()
            .page(
                "/apk/vendor/app/download/",
                &leaf_page("https://www.example.com/?p=4242"),
            )
            .script(
                "/download.php?id=4242",
                vec![Ok(document(
                    "https://cdn.example.com/files/app-1.0.apk",
                    b"PK-bytes".to_vec(),
                ))],
            );
        let mut leaf = LeafTarget::new("/apk/vendor/app/download/");

        let payload = leaf.fetch(&fetcher, &scope()).await.unwrap();
        assert_eq!(leaf.download_id(), Some(4242));
        assert_eq!(leaf.state(), LeafState::Downloaded);
        assert_eq!(leaf.archive_name(), Some("app-1.0.apk"));
        assert_eq!(payload.archive_name(), "app-1.0.apk");
        assert_eq!(payload.size().unwrap(), 8);
        assert_eq!(
            fetcher.calls(),
            vec!["/apk/vendor/app/download/", "/download.php?id=4242"]
        );
    }

    #[tokio::test]
    async fn test_missing_shortlink() {
        let fetcher = ScriptedFetcher::new().page(
            "/apk/app/download/",
            "<html><head><title>No id here</title></head></html>",
        );
        let mut leaf = LeafTarget::new("/apk/app/download/");

        let result = leaf.fetch(&fetcher, &scope()).await;
        assert!(matches!(result, Err(LeafError::IdentifierNotFound { .. })));
        assert_eq!(leaf.state(), LeafState::Initialized);
        assert_eq!(leaf.download_id(), None);
        // Phase 2 never ran
        assert_eq!(fetcher.calls(), vec!["/apk/app/download/"]);
    }

    #[tokio::test]
    async fn test_non_numeric_identifier() {
        let fetcher = ScriptedFetcher::new().page(
            "/apk/app/download/",
            &leaf_page("https://www.example.com/?p=draft"),
        );
        let mut leaf = LeafTarget::new("/apk/app/download/");

        let result = leaf.resolve_identifier(&fetcher, &scope()).await;
        assert!(matches!(result, Err(LeafError::IdentifierNotFound { .. })));
    }

    #[tokio::test]
    async fn test_leaf_page_fetch_failure() {
        let fetcher = ScriptedFetcher::new();
        let mut leaf = LeafTarget::new("/apk/gone/download/");

        let result = leaf.fetch(&fetcher, &scope()).await;
        match result {
            Err(LeafError::Download { source, .. }) => {
                assert!(matches!(source, FetchError::Status { status: 404, .. }));
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        // Leaves are not retried
        assert_eq!(fetcher.call_count("/apk/gone/download/"), 1);
    }

    #[tokio::test]
    async fn test_payload_fetch_failure() {
        let fetcher = ScriptedFetcher::new().page(
            "/apk/app/download/",
            &leaf_page("https://www.example.com/?p=9"),
        );
        let mut leaf = LeafTarget::new("/apk/app/download/");

        let result = leaf.fetch(&fetcher, &scope()).await;
        assert!(matches!(result, Err(LeafError::Download { .. })));
        assert_eq!(leaf.state(), LeafState::Resolved);
        assert_eq!(fetcher.call_count("/download.php?id=9"), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "download_payload called on initialized leaf")]
    async fn test_download_before_resolve_panics() {
        let fetcher = ScriptedFetcher::new();
        let mut leaf = LeafTarget::new("/apk/app/download/");
        let _ = leaf.download_payload(&fetcher, &scope()).await;
    }

    #[test]
    fn test_archive_name_from_url() {
        let url = Url::parse("https://cdn.example.com/a/b/app.apk?token=1").unwrap();
        assert_eq!(archive_name_from_url(&url), Some("app.apk".to_string()));

        let url = Url::parse("https://cdn.example.com/a/b/").unwrap();
        assert_eq!(archive_name_from_url(&url), Some("b".to_string()));

        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(archive_name_from_url(&url), None);
    }
}
