//! Fetch orchestrator
//!
//! Iterates the configured source map, applies the tag filter, dispatches
//! each source to its pipeline runner and collects one History per
//! processed source. One source failing never aborts the run.

use std::collections::BTreeMap;
use std::sync::Arc;

use beehive_common::{History, Result, SourceKind};
use beehive_extract::LlmClient;
use beehive_storage::Storage;
use tracing::{error, info, warn};

use crate::feed_runner::FeedRunner;
use crate::rss_runner::RssRunner;
use crate::source::Source;

/// Drives one fetch run over a source map.
pub struct Orchestrator {
    storage: Arc<dyn Storage>,
    rss: RssRunner,
    feed: FeedRunner,
}

impl Orchestrator {
    pub fn new(storage: Arc<dyn Storage>, llm: Arc<dyn LlmClient>) -> Result<Self> {
        Ok(Self {
            rss: RssRunner::new(storage.clone(), llm)?,
            feed: FeedRunner::new(storage.clone())?,
            storage,
        })
    }

    /// Swap the RSS runner; tests inject scripted fetchers through it.
    pub fn with_rss_runner(mut self, rss: RssRunner) -> Self {
        self.rss = rss;
        self
    }

    /// Process every enabled source matching the tag filter, sequentially.
    /// Returns one History per processed source, in iteration order; a
    /// runner's hard error becomes a `failure` History for that source.
    pub async fn fetch_all(
        &self,
        sources: &BTreeMap<String, Source>,
        tag_filter: &[String],
    ) -> Vec<History> {
        let mut histories = Vec::new();

        for (source_id, source) in sources {
            if !source.enabled {
                info!(source_id = %source_id, "source disabled, skipping");
                continue;
            }
            if !tag_filter.is_empty()
                && !source.tags.iter().any(|t| tag_filter.contains(t))
            {
                continue;
            }

            let outcome = match source.kind {
                SourceKind::Rss => match &source.rss {
                    Some(rss) => self.rss.run(source_id, rss).await,
                    None => {
                        warn!(source_id = %source_id, "RSS source without RSS settings, skipping");
                        continue;
                    }
                },
                SourceKind::Feed => match &source.feed {
                    Some(feed) => self.feed.run(source_id, feed).await,
                    None => {
                        warn!(source_id = %source_id, "feed source without feed settings, skipping");
                        continue;
                    }
                },
            };

            match outcome {
                Ok(history) => histories.push(history),
                Err(err) => {
                    error!(source_id = %source_id, error = %err, "source run failed");
                    let history = History::failure(source_id, source.kind, &err);
                    if let Err(save_err) = self.storage.save_history(history.clone()).await {
                        warn!(
                            source_id = %source_id,
                            error = %save_err,
                            "failed to save failure history"
                        );
                    }
                    histories.push(history);
                }
            }
        }

        histories
    }
}
