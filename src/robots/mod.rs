//! Crawl-permission check against the site's robots.txt
//!
//! The policy document is consulted once, before the first fetch. Any
//! problem obtaining it (a 404 included) is treated as permission granted,
//! matching the permissive default of sites that publish no policy at all.

mod parser;

pub use parser::ParsedRobots;

use std::time::Duration;
use url::Url;

/// Timeout for the policy document fetch
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and parses `<site-root>/robots.txt`
///
/// Fails open: a 404, any non-success status, or any fetch error yields the
/// permissive [`ParsedRobots::allow_all`] rules.
pub async fn fetch_robots(site_root: &Url, user_agent: &str) -> ParsedRobots {
    let robots_url = match site_root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("cannot derive robots.txt URL from {}: {}", site_root, e);
            return ParsedRobots::allow_all();
        }
    };

    let client = match reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(ROBOTS_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("error building robots.txt client: {}", e);
            return ParsedRobots::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("error fetching {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        tracing::info!("no robots.txt found, assuming crawling is allowed");
        return ParsedRobots::allow_all();
    }

    if !response.status().is_success() {
        tracing::warn!(
            "robots.txt fetch returned HTTP {}, assuming crawling is allowed",
            response.status().as_u16()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(content) => ParsedRobots::from_content(&content),
        Err(e) => {
            tracing::warn!("error reading robots.txt body: {}", e);
            ParsedRobots::allow_all()
        }
    }
}

/// Checks whether the crawl policy allows fetching `target`
pub async fn policy_allows(site_root: &Url, target: &Url, user_agent: &str) -> bool {
    let robots = fetch_robots(site_root, user_agent).await;
    let allowed = robots.is_allowed(target.as_str(), user_agent);
    tracing::info!(
        "robots.txt check for {}: {}",
        target,
        if allowed { "allowed" } else { "disallowed" }
    );
    allowed
}
