//! Next-page resolution
//!
//! Pagination on the quote site is a `ul.pager` with an `li.next` entry
//! whose anchor points at the following page, relative to the current one.

use scraper::{Html, Selector};
use url::Url;

/// Resolves the next page URL from a page's pager, if any
///
/// Returns `None` at the natural end of pagination or when the pager link
/// cannot be resolved against the current URL.
pub fn next_page_url(html: &str, current_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("ul.pager li.next a").ok()?;

    let href = document
        .select(&selector)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))?;

    match current_url.join(href) {
        Ok(next) => Some(next),
        Err(e) => {
            tracing::debug!("unresolvable next-page href {:?}: {}", href, e);
            None
        }
    }
}
