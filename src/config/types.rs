use serde::Deserialize;
use url::Url;

/// Main configuration structure for a catalog crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Site scope: which host is crawled and how its links are classified
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// URL scheme used to build absolute URLs ("http" or "https")
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Site host, optionally with a port (e.g. "www.example.com:8080")
    pub host: String,

    /// Additional host patterns treated as the same site (e.g. "*.example.com")
    #[serde(rename = "extra-hosts", default)]
    pub extra_hosts: Vec<String>,

    /// Path prefixes that are in scope; everything else is ignored
    #[serde(rename = "allowed-prefixes", default = "default_allowed_prefixes")]
    pub allowed_prefixes: Vec<String>,

    /// Path suffix marking a download-initiation page
    #[serde(rename = "leaf-suffix", default = "default_leaf_suffix")]
    pub leaf_suffix: String,

    /// Path of the handler that serves the binary payload
    #[serde(
        rename = "download-handler-path",
        default = "default_download_handler_path"
    )]
    pub download_handler_path: String,

    /// Query parameter carrying the download identifier
    #[serde(rename = "download-id-param", default = "default_download_id_param")]
    pub download_id_param: String,
}

impl SiteConfig {
    /// Returns the site root as an absolute URL (`scheme://host/`)
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}/", self.scheme, self.host))
    }
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Path the traversal starts from
    #[serde(rename = "root-path", default = "default_root_path")]
    pub root_path: String,

    /// Maximum hop count from the root page
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of download targets to process before stopping
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// How many times a failed page is rescheduled before being dropped
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Base delay before re-fetching a failed page (milliseconds, jittered)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            max_depth: default_max_depth(),
            max_items: default_max_items(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Proxy pool; each request is routed through a random entry
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Refuse to run without at least one proxy
    #[serde(rename = "require-proxies", default = "default_true")]
    pub require_proxies: bool,

    /// User-Agent rotation list; empty means the built-in list
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxies: Vec::new(),
            require_proxies: true,
            user_agents: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// File that archive entries are appended to
    #[serde(rename = "entries-path", default = "default_entries_path")]
    pub entries_path: String,

    /// Media type used when neither the registry nor the extension helps
    #[serde(rename = "unknown-media-type", default = "default_unknown_media_type")]
    pub unknown_media_type: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            entries_path: default_entries_path(),
            unknown_media_type: default_unknown_media_type(),
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_allowed_prefixes() -> Vec<String> {
    vec!["/apk".to_string(), "/page".to_string()]
}

fn default_leaf_suffix() -> String {
    "/download/".to_string()
}

fn default_download_handler_path() -> String {
    "/wp-content/themes/APKMirror/download.php".to_string()
}

fn default_download_id_param() -> String {
    "id".to_string()
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_max_depth() -> u32 {
    5
}

fn default_max_items() -> usize {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_entries_path() -> String {
    "files.txt".to_string()
}

// ref: RFC 2046
fn default_unknown_media_type() -> String {
    "application/octet-stream".to_string()
}
