//! Quote extraction from page HTML
//!
//! Extraction is a pure function from page content to an ordered sequence
//! of records. One malformed quote block is logged and skipped; it never
//! aborts the rest of the page.

pub mod pagination;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// One harvested quote, serialized as a single JSON line
#[derive(Debug, Clone, Serialize)]
pub struct QuoteRecord {
    /// Quote text, whitespace-trimmed
    pub text: String,

    /// Author name, empty if the page omits it
    pub author: String,

    /// Absolute URL of the author page, empty if unresolved
    pub author_url: String,

    /// Tag names in document order
    pub tags: Vec<String>,

    /// Number of tags, always equal to `tags.len()`
    pub tag_count: usize,

    /// Absolute URL of the page the quote was found on
    pub url: String,
}

/// Extracts all quote records from a page, in document order
pub fn extract_quotes(html: &str, page_url: &Url) -> Vec<QuoteRecord> {
    let document = Html::parse_document(html);

    let quote_selector = match Selector::parse("div.quote") {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("invalid quote selector: {:?}", e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for block in document.select(&quote_selector) {
        match parse_quote_block(block, page_url) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::warn!("skipping malformed quote on {}: {}", page_url, reason);
            }
        }
    }

    records
}

/// Parses one `div.quote` block into a record
///
/// The quote text is required; author and author link degrade to empty
/// strings when absent.
fn parse_quote_block(block: ElementRef, page_url: &Url) -> Result<QuoteRecord, String> {
    let text =
        select_text(block, "span.text").ok_or_else(|| "missing quote text".to_string())?;

    let author = select_text(block, "small.author").unwrap_or_default();

    let author_url = Selector::parse("a")
        .ok()
        .and_then(|selector| {
            block
                .select(&selector)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
                .and_then(|href| page_url.join(href).ok())
        })
        .map(|url| url.to_string())
        .unwrap_or_default();

    let tags = extract_tags(block);
    let tag_count = tags.len();

    Ok(QuoteRecord {
        text,
        author,
        author_url,
        tags,
        tag_count,
        url: page_url.to_string(),
    })
}

/// Collects the trimmed text of the first element matching `selector`
fn select_text(block: ElementRef, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    block
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects tag names from the block's tag list, in document order
fn extract_tags(block: ElementRef) -> Vec<String> {
    let Ok(selector) = Selector::parse("div.tags a.tag") else {
        return Vec::new();
    };

    block
        .select(&selector)
        .map(|tag| tag.text().collect::<String>().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
