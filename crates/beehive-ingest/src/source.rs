//! Source map entries for one orchestrator run

use beehive_common::SourceKind;

/// RSS-specific settings.
#[derive(Debug, Clone)]
pub struct RssSource {
    pub url: String,
    /// 0 = unlimited.
    pub max_articles: usize,
}

/// Feed-specific settings; `url` is already resolved against the schema
/// default.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub schema: String,
    pub url: String,
    /// 0 = unlimited.
    pub max_items: usize,
}

/// One configured source as the orchestrator sees it.
#[derive(Debug, Clone)]
pub struct Source {
    pub kind: SourceKind,
    pub tags: Vec<String>,
    pub enabled: bool,
    pub rss: Option<RssSource>,
    pub feed: Option<FeedSource>,
}
