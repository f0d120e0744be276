//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `Fetcher` trait every page and payload request goes through
//! - Building one HTTP client per configured proxy
//! - Browser-like request headers with a rotating User-Agent
//! - Error classification into `FetchError`

use crate::config::HttpConfig;
use crate::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use url::Url;

/// User-Agent strings rotated across requests when none are configured
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// HTTP status code (always 200 for documents returned by `HttpFetcher`)
    pub status: u16,

    /// Final URL after redirects
    pub final_url: Url,

    /// Raw response body
    pub body: Bytes,
}

impl FetchedDocument {
    /// Returns the body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Retrieves documents from the crawled site
///
/// The traversal engine and the leaf resolver only ever talk to the network
/// through this trait, so both can be driven by an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches an absolute URL; anything but HTTP 200 is a `FetchError`
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError>;
}

/// Production fetcher: proxied reqwest clients with spoofed headers
///
/// One client is built per proxy because reqwest binds proxies at client
/// construction. Every request picks a client and a User-Agent at random.
pub struct HttpFetcher {
    clients: Vec<Client>,
    user_agents: Vec<String>,
}

impl HttpFetcher {
    /// Builds the fetcher from HTTP configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Proxy pool and User-Agent rotation list
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - One client per proxy, or one direct client
    /// * `Err(reqwest::Error)` - A proxy URL was rejected or TLS setup failed
    pub fn new(config: &HttpConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let clients = if config.proxies.is_empty() {
            vec![build_http_client(None, timeout)?]
        } else {
            config
                .proxies
                .iter()
                .map(|proxy| build_http_client(Some(proxy), timeout))
                .collect::<Result<Vec<_>, _>>()?
        };

        let user_agents = if config.user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
        } else {
            config.user_agents.clone()
        };

        tracing::debug!(
            "HTTP fetcher ready: {} client(s), {} user agent(s)",
            clients.len(),
            user_agents.len()
        );

        Ok(Self {
            clients,
            user_agents,
        })
    }

    /// Returns the number of clients (one per proxy)
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Picks a random client and User-Agent for one request
    fn pick(&self) -> Option<(&Client, &str)> {
        let mut rng = rand::thread_rng();
        let client = self.clients.choose(&mut rng)?;
        let user_agent = self.user_agents.choose(&mut rng)?;
        Some((client, user_agent.as_str()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let (client, user_agent) = self.pick().ok_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "no HTTP client configured".to_string(),
        })?;

        let response = client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchedDocument {
            status: status.as_u16(),
            final_url,
            body,
        })
    }
}

/// Builds an HTTP client, optionally routed through a proxy
///
/// # Example
///
/// ```no_run
/// use catalog_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Some("http://127.0.0.1:3128"), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(proxy: Option<&str>, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .default_headers(base_headers())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    builder = match proxy {
        Some(proxy) => builder.proxy(Proxy::all(proxy)?),
        // Ignore HTTP_PROXY and friends: no configured proxy means direct
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Headers sent with every request, apart from the rotating User-Agent
pub fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-us"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Maps a reqwest failure onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: format!("connection failed: {}", error),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
