//! Per-source fetch state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::RunStatus;

/// Cursor and cumulative counters for one configured source.
///
/// One record per source id, keyed by source id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceState {
    pub source_id: String,
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// RSS GUID or feed entry id of the newest item seen.
    pub last_item_id: String,
    pub last_item_date: Option<DateTime<Utc>>,
    pub item_count: u64,
    pub error_count: u64,
    pub last_error: String,
    pub last_status: Option<RunStatus>,
    pub updated_at: DateTime<Utc>,
}

impl SourceState {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            last_fetched_at: None,
            last_item_id: String::new(),
            last_item_date: None,
            item_count: 0,
            error_count: 0,
            last_error: String::new(),
            last_status: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SourceState::new("blog1");
        assert_eq!(state.source_id, "blog1");
        assert!(state.last_item_id.is_empty());
        assert!(state.last_item_date.is_none());
        assert_eq!(state.item_count, 0);
    }
}
