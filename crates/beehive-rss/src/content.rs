//! Main-content extraction for article pages

use std::time::Duration;

use async_trait::async_trait;
use beehive_common::{Error, Result};
use scraper::{Html, Selector};
use tracing::debug;

/// Containers tried in priority order before falling back to `<body>`.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".post-content",
    ".article-content",
    ".entry-content",
    "#content",
    ".content",
];

/// A candidate container shorter than this is assumed to be navigation or
/// boilerplate.
const MIN_CONTENT_LEN: usize = 100;

const ARTICLE_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("beehive/", env!("CARGO_PKG_VERSION"));

/// HTTP client configured for article page fetches.
pub fn article_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(ARTICLE_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::fetch(format!("failed to build HTTP client: {e}")))
}

/// Retrieves article pages. The HTTP implementation is the production one;
/// tests script their own.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Article fetcher backed by a reqwest client.
pub struct HttpArticleFetcher {
    client: reqwest::Client,
}

impl HttpArticleFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: article_client()?,
        })
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        fetch_article(&self.client, url).await
    }
}

/// Fetch an article page. Failure is fatal for this article only.
pub async fn fetch_article(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!(url, "fetching article");

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

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the main textual content of an article page.
///
/// Tries the selector priority list and takes the first container whose
/// collapsed text is long enough; otherwise the whole body text.
pub fn extract_main_content(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in CONTENT_SELECTORS {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&parsed).next() {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if text.len() > MIN_CONTENT_LEN {
                return text;
            }
        }
    }

    collapse_whitespace(
        &document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" "),
    )
}
