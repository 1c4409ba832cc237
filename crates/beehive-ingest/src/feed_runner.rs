//! Structured feed pipeline
//!
//! Parses a feed snapshot into IoCs, upserts them, and flips prior-active
//! IoCs that vanished from the snapshot to inactive (differential refresh).

use std::collections::HashSet;
use std::sync::Arc;

use beehive_common::{
    context_key, generate_id, identity::ContextParams, normalize, Error, History, Ioc, IocStatus,
    Result, SourceKind,
};
use beehive_feeds::{fetch_feed, FeedEntry, SchemaSpec};
use beehive_storage::Storage;
use beehive_vector::NgramVectorizer;
use chrono::Utc;
use tracing::{info, warn};

use crate::runner::{load_state, persist_outcome};
use crate::source::FeedSource;

/// Runs the feed pipeline for one source.
pub struct FeedRunner {
    storage: Arc<dyn Storage>,
    vectorizer: NgramVectorizer,
    client: reqwest::Client,
}

impl FeedRunner {
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self> {
        Ok(Self {
            storage,
            vectorizer: NgramVectorizer::default(),
            client: beehive_feeds::feed_client()?,
        })
    }

    /// Fetch, parse and apply one feed refresh.
    pub async fn run(&self, source_id: &str, source: &FeedSource) -> Result<History> {
        let spec = beehive_feeds::lookup(&source.schema).ok_or_else(|| {
            Error::validation(format!("unknown feed schema: {}", source.schema))
                .with("source_id", source_id)
                .with("schema", &source.schema)
        })?;

        let content = fetch_feed(&self.client, &source.url)
            .await
            .map_err(|e| e.with("source_id", source_id))?;
        let mut entries = beehive_feeds::parse(spec, &content)
            .map_err(|e| e.with("source_id", source_id).with("schema", spec.name))?;
        if source.max_items > 0 {
            entries.truncate(source.max_items);
        }

        self.apply(source_id, source, spec, entries).await
    }

    /// Steps after parsing; split out so tests can feed synthetic entries.
    pub(crate) async fn apply(
        &self,
        source_id: &str,
        source: &FeedSource,
        spec: &SchemaSpec,
        entries: Vec<FeedEntry>,
    ) -> Result<History> {
        let mut state = load_state(&self.storage, source_id).await?;
        let mut history = History::begin(source_id, SourceKind::Feed);
        history.urls.push(source.url.clone());
        history.items_fetched = entries.len() as u64;

        let mut iocs: Vec<Ioc> = Vec::with_capacity(entries.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());

        for entry in &entries {
            let mut params = ContextParams::new();
            params.insert("entry_id".to_string(), entry.id.clone());
            let key = context_key(SourceKind::Feed.as_str(), &params);

            let value = normalize(entry.ioc_type, &entry.value);
            let id = generate_id(source_id, entry.ioc_type, &value, &key);

            let mut tags: Vec<String> = spec
                .default_tags
                .iter()
                .map(|t| t.to_string())
                .collect();
            tags.extend(entry.tags.iter().cloned());

            let text = format!("{} {}", value, entry.description);
            let embedding = match self.vectorizer.vectorize(&text) {
                Ok(v) => v,
                Err(err) => {
                    history.record_error(
                        &Error::validation(format!("vectorization failed: {err}"))
                            .with("source_id", source_id)
                            .with("value", &entry.value),
                    );
                    continue;
                }
            };

            seen.insert(id.clone());
            history.iocs_extracted += 1;
            iocs.push(Ioc {
                id,
                source_id: source_id.to_string(),
                source_kind: SourceKind::Feed,
                ioc_type: entry.ioc_type,
                value,
                description: entry.description.clone(),
                source_url: source.url.clone(),
                context: tags.join(", "),
                embedding,
                status: IocStatus::Active,
                first_seen: entry.first_seen,
                updated_at: entry.last_seen,
            });
        }

        // Prior records drive the differential refresh.
        let prior = match self.storage.list_by_source(source_id).await {
            Ok(prior) => prior,
            Err(err) => {
                history.record_error(&err);
                Vec::new()
            }
        };

        match self.storage.batch_upsert(iocs).await {
            Ok(batch) => {
                history.iocs_created += batch.created;
                history.iocs_updated += batch.updated;
                history.iocs_unchanged += batch.unchanged;
            }
            Err(err) => history.record_error(&err),
        }

        let flips: Vec<Ioc> = prior
            .into_iter()
            .filter(|ioc| ioc.status == IocStatus::Active && !seen.contains(&ioc.id))
            .map(|mut ioc| {
                ioc.status = IocStatus::Inactive;
                ioc
            })
            .collect();
        if !flips.is_empty() {
            info!(source_id, count = flips.len(), "deactivating absent IoCs");
            match self.storage.batch_upsert(flips).await {
                Ok(batch) => history.iocs_updated += batch.updated,
                Err(err) => history.record_error(&err),
            }
        }

        if let Some(last) = entries.iter().rev().find(|e| !e.id.is_empty()) {
            state.last_item_id = last.id.clone();
            state.last_item_date = Some(last.first_seen);
        }
        state.item_count += entries.len() as u64;
        state.error_count += history.error_count;
        state.last_fetched_at = Some(Utc::now());

        history.finish();
        state.last_status = Some(history.status);
        state.last_error = history
            .errors
            .last()
            .map(|e| e.message.clone())
            .unwrap_or_default();

        persist_outcome(&self.storage, state, &history).await;
        if history.error_count > 0 {
            warn!(
                source_id,
                errors = history.error_count,
                status = %history.status,
                "feed run finished with errors"
            );
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beehive_common::{IocType, RunStatus};
    use beehive_storage::MemoryStorage;

    fn runner() -> (FeedRunner, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        (FeedRunner::new(storage.clone()).unwrap(), storage)
    }

    fn feod_source() -> FeedSource {
        FeedSource {
            schema: "abuse_ch_feodotracker".to_string(),
            url: "https://feodotracker.abuse.ch/downloads/ipblocklist.txt".to_string(),
            max_items: 0,
        }
    }

    fn ip_entry(id: &str, value: &str) -> FeedEntry {
        let mut entry = FeedEntry::new(IocType::IPv4, value);
        entry.id = id.to_string();
        entry
    }

    #[tokio::test]
    async fn test_first_refresh_creates_active_iocs() {
        let (runner, storage) = runner();
        let spec = beehive_feeds::lookup("abuse_ch_feodotracker").unwrap();

        let entries = vec![
            ip_entry("a", "192.0.2.1"),
            ip_entry("b", "192.0.2.2"),
            ip_entry("c", "192.0.2.3"),
        ];
        let history = runner
            .apply("f1", &feod_source(), spec, entries)
            .await
            .unwrap();

        assert_eq!(history.status, RunStatus::Success);
        assert_eq!(history.items_fetched, 3);
        assert_eq!(history.iocs_created, 3);

        let stored = storage.list_by_source("f1").await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|i| i.status == IocStatus::Active));
        assert!(stored.iter().all(|i| i.embedding.len() == 128));
    }

    #[tokio::test]
    async fn test_differential_refresh_flips_absent_to_inactive() {
        let (runner, storage) = runner();
        let spec = beehive_feeds::lookup("abuse_ch_feodotracker").unwrap();
        let source = feod_source();

        // first refresh: {A, B, C}
        runner
            .apply(
                "f1",
                &source,
                spec,
                vec![
                    ip_entry("A", "192.0.2.1"),
                    ip_entry("B", "192.0.2.2"),
                    ip_entry("C", "192.0.2.3"),
                ],
            )
            .await
            .unwrap();

        // second refresh: {B, D}
        let history = runner
            .apply(
                "f1",
                &source,
                spec,
                vec![ip_entry("B", "192.0.2.2"), ip_entry("D", "192.0.2.4")],
            )
            .await
            .unwrap();
        assert_eq!(history.iocs_created, 1); // D
        assert_eq!(history.iocs_unchanged, 1); // B
        assert_eq!(history.iocs_updated, 2); // A and C flipped

        let stored = storage.list_by_source("f1").await.unwrap();
        let by_value = |v: &str| {
            stored
                .iter()
                .find(|i| i.value == v)
                .unwrap_or_else(|| panic!("missing {v}"))
                .status
        };
        assert_eq!(by_value("192.0.2.1"), IocStatus::Inactive);
        assert_eq!(by_value("192.0.2.3"), IocStatus::Inactive);
        assert_eq!(by_value("192.0.2.2"), IocStatus::Active);
        assert_eq!(by_value("192.0.2.4"), IocStatus::Active);

        // reappearance flips back to active
        let history = runner
            .apply("f1", &source, spec, vec![ip_entry("A", "192.0.2.1")])
            .await
            .unwrap();
        assert!(history.iocs_updated >= 1);
        let stored = storage.list_by_source("f1").await.unwrap();
        assert_eq!(
            stored.iter().find(|i| i.value == "192.0.2.1").unwrap().status,
            IocStatus::Active
        );
    }

    #[tokio::test]
    async fn test_entries_without_ids_collapse_by_value() {
        let (runner, storage) = runner();
        let spec = beehive_feeds::lookup("abuse_ch_feodotracker").unwrap();

        let entries = vec![
            FeedEntry::new(IocType::IPv4, "192.0.2.9"),
            FeedEntry::new(IocType::IPv4, "192.0.2.9"),
        ];
        let history = runner
            .apply("f1", &feod_source(), spec, entries)
            .await
            .unwrap();
        assert_eq!(history.iocs_created, 1);
        assert_eq!(storage.list_by_source("f1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_is_success() {
        let (runner, storage) = runner();
        let spec = beehive_feeds::lookup("abuse_ch_feodotracker").unwrap();

        let history = runner
            .apply("f1", &feod_source(), spec, Vec::new())
            .await
            .unwrap();
        assert_eq!(history.status, RunStatus::Success);
        assert_eq!(history.items_fetched, 0);

        let state = storage.get_state("f1").await.unwrap();
        assert_eq!(state.last_status, Some(RunStatus::Success));
    }

    #[tokio::test]
    async fn test_state_and_history_recorded() {
        let (runner, storage) = runner();
        let spec = beehive_feeds::lookup("abuse_ch_feodotracker").unwrap();

        runner
            .apply(
                "f1",
                &feod_source(),
                spec,
                vec![ip_entry("x1", "192.0.2.1"), ip_entry("x2", "192.0.2.2")],
            )
            .await
            .unwrap();

        let state = storage.get_state("f1").await.unwrap();
        assert_eq!(state.item_count, 2);
        assert_eq!(state.last_item_id, "x2");
        assert!(state.last_fetched_at.is_some());

        let (histories, total) = storage
            .list_histories_by_source("f1", 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(histories[0].items_fetched, 2);
        assert_eq!(histories[0].urls.len(), 1);
    }
}
