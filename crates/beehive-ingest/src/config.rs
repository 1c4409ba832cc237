//! Source configuration
//!
//! Parsed from TOML supplied by the embedding binary. Sources live under
//! `[rss.<source_id>]` and `[feed.<source_id>]` tables; validation happens
//! at load time so runs never see a malformed source.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use beehive_common::{Error, Result, SourceKind};
use regex::Regex;
use serde::Deserialize;

use crate::source::{FeedSource, RssSource, Source};

/// `[rss.<source_id>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct RssSourceConfig {
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    /// 0 = unlimited.
    #[serde(default)]
    pub max_articles: i64,
}

/// `[feed.<source_id>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSourceConfig {
    pub schema: String,
    /// Overrides the schema's default endpoint.
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    /// 0 = unlimited.
    #[serde(default)]
    pub max_items: i64,
}

/// Full source configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rss: BTreeMap<String, RssSourceConfig>,
    #[serde(default)]
    pub feed: BTreeMap<String, FeedSourceConfig>,
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9\-_]*[a-zA-Z0-9])?$").unwrap())
}

const MAX_TAG_LEN: usize = 63;

fn validate_tags(source_id: &str, tags: &[String]) -> Result<()> {
    for tag in tags {
        if tag.len() > MAX_TAG_LEN || !tag_re().is_match(tag) {
            return Err(Error::config(format!("malformed tag: {tag:?}"))
                .with("source_id", source_id)
                .with("tag", tag));
        }
    }
    Ok(())
}

fn validate_url(source_id: &str, raw: &str) -> Result<()> {
    url::Url::parse(raw).map_err(|e| {
        Error::config(format!("invalid URL: {e}"))
            .with("source_id", source_id)
            .with("url", raw)
    })?;
    Ok(())
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)
            .map_err(|e| Error::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (source_id, rss) in &self.rss {
            if self.feed.contains_key(source_id) {
                return Err(Error::config(format!(
                    "duplicate source id across [rss] and [feed]: {source_id}"
                ))
                .with("source_id", source_id));
            }
            validate_url(source_id, &rss.url)?;
            validate_tags(source_id, &rss.tags)?;
            if rss.max_articles < 0 {
                return Err(Error::config("max_articles must be >= 0")
                    .with("source_id", source_id));
            }
        }

        for (source_id, feed) in &self.feed {
            if beehive_feeds::lookup(&feed.schema).is_none() {
                return Err(
                    Error::config(format!("unknown feed schema: {}", feed.schema))
                        .with("source_id", source_id)
                        .with("schema", &feed.schema),
                );
            }
            if let Some(url) = &feed.url {
                validate_url(source_id, url)?;
            }
            validate_tags(source_id, &feed.tags)?;
            if feed.max_items < 0 {
                return Err(
                    Error::config("max_items must be >= 0").with("source_id", source_id)
                );
            }
        }

        Ok(())
    }

    /// The validated source map an orchestrator run iterates.
    pub fn sources(&self) -> BTreeMap<String, Source> {
        let mut sources = BTreeMap::new();

        for (source_id, rss) in &self.rss {
            sources.insert(
                source_id.clone(),
                Source {
                    kind: SourceKind::Rss,
                    tags: rss.tags.clone(),
                    enabled: !rss.disabled,
                    rss: Some(RssSource {
                        url: rss.url.clone(),
                        max_articles: rss.max_articles.max(0) as usize,
                    }),
                    feed: None,
                },
            );
        }

        for (source_id, feed) in &self.feed {
            let default_url = beehive_feeds::lookup(&feed.schema)
                .map(|s| s.default_url.to_string())
                .unwrap_or_default();
            sources.insert(
                source_id.clone(),
                Source {
                    kind: SourceKind::Feed,
                    tags: feed.tags.clone(),
                    enabled: !feed.disabled,
                    rss: None,
                    feed: Some(FeedSource {
                        schema: feed.schema.clone(),
                        url: feed.url.clone().unwrap_or(default_url),
                        max_items: feed.max_items.max(0) as usize,
                    }),
                },
            );
        }

        sources
    }
}
