//! Storage contract for the beehive core
//!
//! A single polymorphic contract covering IoC CRUD, per-source state,
//! per-run histories and vector nearest-neighbor search. The in-memory
//! backend serves tests and development; the `document` module carries the
//! wire representation a durable backend persists, kept separate so domain
//! types stay free of infrastructure annotations.

pub mod document;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use beehive_common::{History, Ioc, Result, SourceState};

pub use memory::MemoryStorage;

/// Field to order `list` results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    UpdatedAt,
    FirstSeen,
    Value,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Pagination and ordering for `list`.
///
/// `limit == 0` means unlimited for the in-memory backend; a remote backend
/// is expected to substitute a bounded default instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub offset: usize,
    pub limit: usize,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Ioc>,
    pub total: u64,
}

/// What a single upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Tally of a batched upsert over distinct ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl BatchResult {
    pub fn add(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: BatchResult) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

/// Storage contract. All operations are safe under concurrent callers;
/// upserts of the same id serialize.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get an IoC by id.
    async fn get(&self, id: &str) -> Result<Ioc>;

    /// All IoCs belonging to a source.
    async fn list_by_source(&self, source_id: &str) -> Result<Vec<Ioc>>;

    /// Paginated listing, default order `updated_at DESC`.
    async fn list(&self, opts: ListOptions) -> Result<ListResult>;

    /// Insert or update one IoC. `first_seen` is assigned on first insert
    /// and never overwritten; `updated_at` is refreshed only when one of
    /// {description, status, source URL, context} changed.
    async fn upsert(&self, ioc: Ioc) -> Result<UpsertOutcome>;

    /// Upsert a batch: prior records are fetched in one read per chunk and
    /// writes are issued only for created and updated records.
    async fn batch_upsert(&self, iocs: Vec<Ioc>) -> Result<BatchResult>;

    /// Save per-source state, refreshing its `updated_at`.
    async fn save_state(&self, state: SourceState) -> Result<()>;

    /// Get state for one source.
    async fn get_state(&self, source_id: &str) -> Result<SourceState>;

    /// Get states for many sources at once (one request for the resolver
    /// layer to batch per-source fields through).
    async fn batch_get_states(&self, source_ids: &[String]) -> Result<HashMap<String, SourceState>>;

    /// Append a run history under its source.
    async fn save_history(&self, history: History) -> Result<()>;

    /// Histories for a source ordered `started_at DESC`, with a total count
    /// that stays valid under pagination.
    async fn list_histories_by_source(
        &self,
        source_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<History>, u64)>;

    /// Get one history record under a source.
    async fn get_history(&self, source_id: &str, history_id: &str) -> Result<History>;

    /// Nearest stored IoCs to a query embedding, ranked by cosine distance.
    /// `limit == 0` returns an empty list; a dimension mismatch fails.
    async fn find_nearest(&self, query: &[f32], limit: usize) -> Result<Vec<Ioc>>;
}
