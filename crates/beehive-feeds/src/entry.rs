//! Transient per-entry record produced by feed parsers

use beehive_common::IocType;
use chrono::{DateTime, Utc};

/// One parsed feed row or line. Not persisted directly; converted into an
/// IoC by the feed runner.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Feed-assigned entry id; empty when the feed has none.
    pub id: String,
    pub ioc_type: IocType,
    pub value: String,
    pub description: String,
    pub tags: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl FeedEntry {
    pub fn new(ioc_type: IocType, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            ioc_type,
            value: value.into(),
            description: String::new(),
            tags: Vec::new(),
            first_seen: now,
            last_seen: now,
        }
    }
}
