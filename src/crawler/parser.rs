//! HTML parser for extracting links and download metadata
//!
//! This module handles parsing HTML content to extract:
//! - Candidate links to classify (from `<a href>` tags)
//! - The shortlink that carries a download target's identifier

use scraper::{Html, Selector};
use url::Url;

/// Extracts every candidate hyperlink from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` values, trimmed, in document order
///
/// **Exclude:**
/// - Empty hrefs
/// - Fragment-only links (same page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
///
/// Scope decisions (host, prefixes) are left to the link classifier.
/// A document without any anchors, or without any structure at all,
/// simply yields no links.
///
/// # Example
///
/// ```
/// use catalog_crawler::crawler::extract_candidate_links;
///
/// let html = r##"<html><body><a href="/apk/">Apps</a><a href="#top">Top</a></body></html>"##;
/// assert_eq!(extract_candidate_links(html), vec!["/apk/".to_string()]);
/// ```
pub fn extract_candidate_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            if is_candidate(href) {
                links.push(href.to_string());
            }
        }
    }

    links
}

/// Returns the `href` of the page's `<link rel="shortlink">`, if any
///
/// Download pages advertise their numeric identifier through this element
/// (`https://site/?p=12345`).
pub fn extract_shortlink(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("link[rel='shortlink'][href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Parses the identifier out of a shortlink href
///
/// The identifier is the value of the first query parameter.
///
/// # Returns
///
/// * `Ok(u64)` - The numeric identifier
/// * `Err(String)` - Why the shortlink could not be used
pub fn parse_shortlink_id(shortlink: &str, base_url: &Url) -> Result<u64, String> {
    let url = base_url
        .join(shortlink)
        .map_err(|e| format!("malformed shortlink '{}': {}", shortlink, e))?;

    let (_, value) = url
        .query_pairs()
        .next()
        .ok_or_else(|| format!("shortlink '{}' has no query parameter", shortlink))?;

    value
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("shortlink value '{}' is not a number", value))
}

fn is_candidate(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lowered = href.to_ascii_lowercase();
    !(lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:"))
}
