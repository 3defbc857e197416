//! Crawl target handling
//!
//! Targets are absolute URLs. Before any visited-set comparison the fragment
//! is stripped, so `/page/2/` and `/page/2/#top` count as the same page.

use url::Url;

/// Key used for duplicate detection within a single run
///
/// The fragment never reaches the server, so two URLs differing only in
/// fragment identify the same page.
pub fn dedup_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

/// Derives the site root (scheme + authority) from a target URL
///
/// The root is where the crawl-permission document lives and the base for
/// dry-run page synthesis.
pub fn site_root(url: &Url) -> Option<Url> {
    let mut root = url.clone();
    root.set_fragment(None);
    root.set_query(None);
    root.set_path("/");
    // URLs without a host (e.g. data:) cannot anchor a crawl
    root.host_str()?;
    Some(root)
}
