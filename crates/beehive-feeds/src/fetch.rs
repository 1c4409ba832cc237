//! HTTP fetch for feed documents

use std::time::Duration;

use beehive_common::{Error, Result};
use tracing::info;

/// Feed lists can be large; allow a longer window than article fetches.
const FEED_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("beehive/", env!("CARGO_PKG_VERSION"));

/// HTTP client configured for feed-list downloads.
pub fn feed_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FEED_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::fetch(format!("failed to build HTTP client: {e}")))
}

/// Download a feed document. Non-200 statuses and transport errors are
/// fatal for the feed.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String> {
    info!(url, "fetching feed");

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

    response
        .text()
        .await
        .map_err(|e| Error::fetch(format!("failed to read body: {e}")).with("url", url))
}
