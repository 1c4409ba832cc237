//! In-memory storage backend
//!
//! A single reader-writer lock guards all maps; every returned record is a
//! defensive copy. Used by tests and development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use beehive_common::{Error, History, Ioc, Result, SourceState, EMBEDDING_DIM};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    BatchResult, ListOptions, ListResult, SortField, SortOrder, Storage, UpsertOutcome,
};

/// Batch upserts are processed in chunks to bound memory.
const BATCH_CHUNK_SIZE: usize = 1000;

#[derive(Default)]
struct Inner {
    iocs: HashMap<String, Ioc>,
    states: HashMap<String, SourceState>,
    /// Histories per source id, append order.
    histories: HashMap<String, Vec<History>>,
}

/// In-memory storage for tests and development.
pub struct MemoryStorage {
    inner: RwLock<Inner>,
    embedding_dim: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_dim(EMBEDDING_DIM)
    }

    pub fn with_dim(embedding_dim: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            embedding_dim,
        }
    }

    /// Change-detecting write of one IoC against the prior map. The caller
    /// holds the write lock.
    fn apply_upsert(inner: &mut Inner, mut ioc: Ioc) -> UpsertOutcome {
        let now = Utc::now();
        match inner.iocs.get(&ioc.id) {
            None => {
                ioc.first_seen = now;
                ioc.updated_at = now;
                inner.iocs.insert(ioc.id.clone(), ioc);
                UpsertOutcome::Created
            }
            Some(prior) if !ioc.differs_from(prior) => UpsertOutcome::Unchanged,
            Some(prior) => {
                ioc.first_seen = prior.first_seen;
                ioc.updated_at = now;
                inner.iocs.insert(ioc.id.clone(), ioc);
                UpsertOutcome::Updated
            }
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, id: &str) -> Result<Ioc> {
        self.inner
            .read()
            .iocs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("ioc", id))
    }

    async fn list_by_source(&self, source_id: &str) -> Result<Vec<Ioc>> {
        let inner = self.inner.read();
        Ok(inner
            .iocs
            .values()
            .filter(|ioc| ioc.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn list(&self, opts: ListOptions) -> Result<ListResult> {
        let inner = self.inner.read();
        let mut items: Vec<Ioc> = inner.iocs.values().cloned().collect();
        drop(inner);

        items.sort_by(|a, b| {
            let ord = match opts.sort_field {
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::FirstSeen => a.first_seen.cmp(&b.first_seen),
                SortField::Value => a.value.cmp(&b.value),
                SortField::Id => a.id.cmp(&b.id),
            };
            match opts.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = items.len() as u64;
        let items: Vec<Ioc> = items
            .into_iter()
            .skip(opts.offset)
            .take(if opts.limit == 0 {
                usize::MAX
            } else {
                opts.limit
            })
            .collect();

        Ok(ListResult { items, total })
    }

    async fn upsert(&self, ioc: Ioc) -> Result<UpsertOutcome> {
        ioc.validate(self.embedding_dim)?;
        let mut inner = self.inner.write();
        Ok(Self::apply_upsert(&mut inner, ioc))
    }

    async fn batch_upsert(&self, iocs: Vec<Ioc>) -> Result<BatchResult> {
        for ioc in &iocs {
            ioc.validate(self.embedding_dim)?;
        }

        // Counts are over distinct ids: a later occurrence of an id within
        // the batch supersedes earlier ones.
        let mut deduped: Vec<Ioc> = Vec::with_capacity(iocs.len());
        let mut index_by_id: HashMap<String, usize> = HashMap::new();
        for ioc in iocs {
            match index_by_id.get(&ioc.id) {
                Some(&i) => deduped[i] = ioc,
                None => {
                    index_by_id.insert(ioc.id.clone(), deduped.len());
                    deduped.push(ioc);
                }
            }
        }

        let mut result = BatchResult::default();
        for chunk in deduped.chunks(BATCH_CHUNK_SIZE) {
            // One lock acquisition per chunk: priors are read and writes
            // applied without interleaving other writers.
            let mut inner = self.inner.write();
            for ioc in chunk {
                result.add(Self::apply_upsert(&mut inner, ioc.clone()));
            }
        }
        debug!(
            created = result.created,
            updated = result.updated,
            unchanged = result.unchanged,
            "batch upsert applied"
        );
        Ok(result)
    }

    async fn save_state(&self, mut state: SourceState) -> Result<()> {
        if state.source_id.is_empty() {
            return Err(Error::validation("source state has empty source_id"));
        }
        state.updated_at = Utc::now();
        self.inner
            .write()
            .states
            .insert(state.source_id.clone(), state);
        Ok(())
    }

    async fn get_state(&self, source_id: &str) -> Result<SourceState> {
        self.inner
            .read()
            .states
            .get(source_id)
            .cloned()
            .ok_or_else(|| Error::not_found("source state", source_id))
    }

    async fn batch_get_states(
        &self,
        source_ids: &[String],
    ) -> Result<HashMap<String, SourceState>> {
        let inner = self.inner.read();
        Ok(source_ids
            .iter()
            .filter_map(|id| inner.states.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    async fn save_history(&self, history: History) -> Result<()> {
        if history.source_id.is_empty() {
            return Err(Error::validation("history has empty source_id"));
        }
        self.inner
            .write()
            .histories
            .entry(history.source_id.clone())
            .or_default()
            .push(history);
        Ok(())
    }

    async fn list_histories_by_source(
        &self,
        source_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<History>, u64)> {
        let inner = self.inner.read();
        let mut items: Vec<History> = inner
            .histories
            .get(source_id)
            .cloned()
            .unwrap_or_default();
        drop(inner);

        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        let total = items.len() as u64;
        let items: Vec<History> = items
            .into_iter()
            .skip(offset)
            .take(if limit == 0 { usize::MAX } else { limit })
            .collect();
        Ok((items, total))
    }

    async fn get_history(&self, source_id: &str, history_id: &str) -> Result<History> {
        self.inner
            .read()
            .histories
            .get(source_id)
            .and_then(|h| h.iter().find(|x| x.id == history_id))
            .cloned()
            .ok_or_else(|| Error::not_found("history", history_id))
    }

    async fn find_nearest(&self, query: &[f32], limit: usize) -> Result<Vec<Ioc>> {
        if query.len() != self.embedding_dim {
            return Err(Error::validation(format!(
                "query embedding has {} dimensions, expected {}",
                query.len(),
                self.embedding_dim
            )));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let inner = self.inner.read();
        let mut scored: Vec<(f32, Ioc)> = inner
            .iocs
            .values()
            .filter(|ioc| !ioc.embedding.is_empty())
            .filter_map(|ioc| {
                beehive_vector::cosine_similarity(query, &ioc.embedding)
                    .ok()
                    .map(|sim| (1.0 - sim, ioc.clone()))
            })
            .collect();
        drop(inner);

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, ioc)| ioc).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beehive_common::{IocStatus, IocType, SourceKind};
    use beehive_vector::NgramVectorizer;

    fn sample_ioc(id: &str, source_id: &str, value: &str) -> Ioc {
        Ioc {
            id: id.to_string(),
            source_id: source_id.to_string(),
            source_kind: SourceKind::Feed,
            ioc_type: IocType::IPv4,
            value: value.to_string(),
            description: "test".to_string(),
            source_url: String::new(),
            context: String::new(),
            embedding: Vec::new(),
            status: IocStatus::Active,
            first_seen: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_preserves_first_seen() {
        let storage = MemoryStorage::new();
        let ioc = sample_ioc("ioc_1", "s1", "192.0.2.1");

        // Insert
        assert_eq!(
            storage.upsert(ioc.clone()).await.unwrap(),
            UpsertOutcome::Created
        );
        let stored = storage.get("ioc_1").await.unwrap();
        let first_seen = stored.first_seen;
        assert!(stored.first_seen <= stored.updated_at);

        // Unchanged upsert skips the write
        let again = storage.upsert(stored.clone()).await.unwrap();
        assert_eq!(again, UpsertOutcome::Unchanged);

        // Changed description refreshes updated_at, keeps first_seen
        let mut changed = stored.clone();
        changed.description = "new description".to_string();
        assert_eq!(
            storage.upsert(changed).await.unwrap(),
            UpsertOutcome::Updated
        );
        let after = storage.get("ioc_1").await.unwrap();
        assert_eq!(after.first_seen, first_seen);
        assert!(after.updated_at >= after.first_seen);
        assert_eq!(after.description, "new description");
    }

    #[tokio::test]
    async fn test_batch_upsert_counts() {
        let storage = MemoryStorage::new();
        let iocs = vec![
            sample_ioc("ioc_a", "s1", "192.0.2.1"),
            sample_ioc("ioc_b", "s1", "192.0.2.2"),
            sample_ioc("ioc_c", "s1", "192.0.2.3"),
        ];

        let first = storage.batch_upsert(iocs.clone()).await.unwrap();
        assert_eq!(first.created, 3);
        assert_eq!(first.updated, 0);
        assert_eq!(first.unchanged, 0);

        // Idempotent: replay reports everything unchanged
        let second = storage.batch_upsert(iocs).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 3);
    }

    #[tokio::test]
    async fn test_batch_upsert_distinct_ids() {
        let storage = MemoryStorage::new();
        let mut dup = sample_ioc("ioc_a", "s1", "192.0.2.1");
        dup.description = "later wins".to_string();
        let iocs = vec![sample_ioc("ioc_a", "s1", "192.0.2.1"), dup];

        let result = storage.batch_upsert(iocs).await.unwrap();
        assert_eq!(result.created + result.updated + result.unchanged, 1);
        let stored = storage.get("ioc_a").await.unwrap();
        assert_eq!(stored.description, "later wins");
    }

    #[tokio::test]
    async fn test_list_sorted_and_paginated() {
        let storage = MemoryStorage::new();
        for i in 0..5 {
            let ioc = sample_ioc(&format!("ioc_{i}"), "s1", &format!("192.0.2.{i}"));
            storage.upsert(ioc).await.unwrap();
        }

        let all = storage.list(ListOptions::default()).await.unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.items.len(), 5);
        // Default order is updated_at DESC
        for pair in all.items.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }

        let page = storage
            .list(ListOptions {
                offset: 3,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);

        // Offset past the end: empty items, total intact
        let past = storage
            .list(ListOptions {
                offset: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(past.items.is_empty());
        assert_eq!(past.total, 5);
    }

    #[tokio::test]
    async fn test_state_round_trip() {
        let storage = MemoryStorage::new();
        let mut state = SourceState::new("blog1");
        state.last_item_id = "guid-9".to_string();
        state.item_count = 42;

        storage.save_state(state.clone()).await.unwrap();
        let loaded = storage.get_state("blog1").await.unwrap();
        assert_eq!(loaded.last_item_id, "guid-9");
        assert_eq!(loaded.item_count, 42);
        assert!(loaded.updated_at >= state.updated_at);

        assert!(storage.get_state("missing").await.is_err());
        assert!(storage
            .save_state(SourceState::new(""))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_batch_get_states() {
        let storage = MemoryStorage::new();
        storage.save_state(SourceState::new("s1")).await.unwrap();
        storage.save_state(SourceState::new("s2")).await.unwrap();

        let ids = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
        let states = storage.batch_get_states(&ids).await.unwrap();
        assert_eq!(states.len(), 2);
        assert!(states.contains_key("s1"));
        assert!(!states.contains_key("s3"));
    }

    #[tokio::test]
    async fn test_histories_newest_first() {
        let storage = MemoryStorage::new();
        for _ in 0..3 {
            let history = History::begin("s1", SourceKind::Feed);
            storage.save_history(history).await.unwrap();
        }

        let (items, total) = storage
            .list_histories_by_source("s1", 2, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
        assert!(items[0].started_at >= items[1].started_at);

        let found = storage.get_history("s1", &items[0].id).await.unwrap();
        assert_eq!(found.id, items[0].id);
        assert!(storage.get_history("s1", "nope").await.is_err());
    }

    #[tokio::test]
    async fn test_find_nearest() {
        let storage = MemoryStorage::new();
        let vectorizer = NgramVectorizer::default();

        for (id, value) in [
            ("ioc_g", "google.com"),
            ("ioc_t", "gogle.com"),
            ("ioc_m", "microsoft.com"),
        ] {
            let mut ioc = sample_ioc(id, "s1", value);
            ioc.ioc_type = IocType::Domain;
            ioc.embedding = vectorizer.vectorize(value).unwrap();
            storage.upsert(ioc).await.unwrap();
        }

        let query = vectorizer.vectorize("google.com").unwrap();
        let nearest = storage.find_nearest(&query, 2).await.unwrap();
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].value, "google.com");
        assert_eq!(nearest[1].value, "gogle.com");

        // limit 0 returns nothing
        assert!(storage.find_nearest(&query, 0).await.unwrap().is_empty());

        // dimension mismatch fails
        assert!(storage.find_nearest(&[0.5; 3], 5).await.is_err());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_embedding() {
        let storage = MemoryStorage::new();
        let mut ioc = sample_ioc("ioc_bad", "s1", "192.0.2.9");
        ioc.embedding = vec![0.0; 12];
        assert!(storage.upsert(ioc).await.is_err());
    }
}
