//! Feed XML fetching and parsing

use std::time::Duration;

use beehive_common::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// One article carried by a feed, order-preserving from the feed document.
#[derive(Debug, Clone)]
pub struct Article {
    /// Feed GUID; the link when the feed supplies no GUID.
    pub guid: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub published: DateTime<Utc>,
}

const FEED_XML_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("beehive/", env!("CARGO_PKG_VERSION"));

/// HTTP client configured for feed XML downloads.
pub fn feed_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FEED_XML_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::fetch(format!("failed to build HTTP client: {e}")))
}

/// Parse a feed document into articles, preserving feed order.
///
/// Publish time prefers the feed's `published` field, then `updated`, then
/// the current time.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Article>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| Error::parse(format!("unparseable feed: {e}")))?;

    let articles = feed
        .entries
        .into_iter()
        .map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let guid = if entry.id.is_empty() {
                url.clone()
            } else {
                entry.id
            };
            Article {
                guid,
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                url,
                summary: entry.summary.map(|t| t.content).unwrap_or_default(),
                published: entry
                    .published
                    .or(entry.updated)
                    .unwrap_or_else(Utc::now),
            }
        })
        .collect();

    Ok(articles)
}

/// Fetch the feed XML and parse it.
pub async fn fetch_and_parse(client: &reqwest::Client, url: &str) -> Result<Vec<Article>> {
    info!(url, "fetching RSS feed");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::fetch(format!("request failed: {e}")).with("url", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::fetch(format!("unexpected HTTP status {status}"))
            .with("url", url)
            .with("status", status.as_str()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::fetch(format!("failed to read body: {e}")).with("url", url))?;

    parse_feed(&bytes).map_err(|e| e.with("url", url))
}
