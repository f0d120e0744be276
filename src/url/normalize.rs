use crate::UrlError;
use url::Url;

/// Schemes that can never point at a crawlable page
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a raw href against the page it was found on
///
/// Relative hrefs (`child/`, `../other`, `/abs`, `//host/path`) are resolved
/// the way a browser would. Only HTTP(S) results are accepted.
///
/// # Arguments
///
/// * `href` - The raw `href` attribute value
/// * `page_url` - Absolute URL of the page containing the link
///
/// # Returns
///
/// * `Ok(Url)` - The absolute link target
/// * `Err(UrlError)` - The link is malformed or uses a non-HTTP scheme
pub fn resolve_href(href: &str, page_url: &Url) -> Result<Url, UrlError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Malformed("empty href".to_string()));
    }

    let lowered = href.to_ascii_lowercase();
    if let Some(scheme) = IGNORED_SCHEMES.iter().find(|s| lowered.starts_with(*s)) {
        return Err(UrlError::InvalidScheme(scheme.trim_end_matches(':').to_string()));
    }

    let url = page_url
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Normalizes a URL path into the canonical form used as a page identity
///
/// # Normalization Steps
///
/// 1. Empty path becomes `/`
/// 2. Runs of slashes collapse into one
/// 3. Remaining dot segments (`.` and `..`) are resolved
/// 4. A trailing slash is preserved: catalog paths are directory-like and
///    the site distinguishes `/apk/foo` from `/apk/foo/`
///
/// Query and fragment never reach this function; callers pass `Url::path()`.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::canonical_path;
///
/// assert_eq!(canonical_path(""), "/");
/// assert_eq!(canonical_path("/apk//vendor/./app/"), "/apk/vendor/app/");
/// assert_eq!(canonical_path("/apk/vendor/../other"), "/apk/other");
/// ```
pub fn canonical_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let trailing_slash = path.len() > 1 && path.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if trailing_slash {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://www.example.com/apk/vendor/").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve_href("/apk/other/", &page_url()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/apk/other/");
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve_href("app/", &page_url()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/apk/vendor/app/");
    }

    #[test]
    fn test_resolve_parent_path() {
        let url = resolve_href("../page/2/", &page_url()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/apk/page/2/");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let url = resolve_href("//cdn.other.com/x", &page_url()).unwrap();
        assert_eq!(url.host_str(), Some("cdn.other.com"));
    }

    #[test]
    fn test_skip_special_schemes() {
        for href in [
            "javascript:void(0)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:text/html,<h1>x</h1>",
            "JavaScript:alert(1)",
        ] {
            assert!(matches!(
                resolve_href(href, &page_url()),
                Err(UrlError::InvalidScheme(_))
            ));
        }
    }

    #[test]
    fn test_reject_ftp() {
        assert!(resolve_href("ftp://www.example.com/apk/x", &page_url()).is_err());
    }

    #[test]
    fn test_reject_empty() {
        assert!(resolve_href("   ", &page_url()).is_err());
    }

    #[test]
    fn test_reject_malformed() {
        assert!(resolve_href("http://[::1", &page_url()).is_err());
    }

    #[test]
    fn test_canonical_root() {
        assert_eq!(canonical_path(""), "/");
        assert_eq!(canonical_path("/"), "/");
        assert_eq!(canonical_path("//"), "/");
    }

    #[test]
    fn test_canonical_keeps_trailing_slash() {
        assert_eq!(canonical_path("/apk/vendor/"), "/apk/vendor/");
        assert_eq!(canonical_path("/apk/vendor"), "/apk/vendor");
    }

    #[test]
    fn test_canonical_collapses_slashes() {
        assert_eq!(canonical_path("///apk//vendor///app"), "/apk/vendor/app");
    }

    #[test]
    fn test_canonical_parent_at_root() {
        assert_eq!(canonical_path("/../apk"), "/apk");
    }
}
