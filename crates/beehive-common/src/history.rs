//! Per-run fetch history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContextValues, Error};
use crate::ioc::SourceKind;

/// Outcome of a fetch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "failure")]
    Failure,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Partial => f.write_str("partial"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

impl RunStatus {
    /// Status policy: failure when nothing was fetched and errors occurred,
    /// partial when both happened, success otherwise (including a
    /// legitimately empty feed with no errors).
    pub fn determine(items_fetched: u64, error_count: u64) -> Self {
        match (items_fetched, error_count) {
            (_, 0) => Self::Success,
            (0, _) => Self::Failure,
            _ => Self::Partial,
        }
    }
}

/// One error recorded during a run, with structured context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryError {
    pub message: String,
    pub values: ContextValues,
}

impl From<&Error> for HistoryError {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            values: err.values(),
        }
    }
}

/// One record per fetch run, child of a source. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    /// Time-sortable unique identifier (UUIDv7).
    pub id: String,
    pub source_id: String,
    pub source_kind: SourceKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub urls: Vec<String>,
    pub items_fetched: u64,
    pub iocs_extracted: u64,
    pub iocs_created: u64,
    pub iocs_updated: u64,
    pub iocs_unchanged: u64,
    pub error_count: u64,
    pub errors: Vec<HistoryError>,
    pub created_at: DateTime<Utc>,
}

impl History {
    /// Start a new run record; counters are filled in as the run proceeds.
    pub fn begin(source_id: impl Into<String>, source_kind: SourceKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            source_id: source_id.into(),
            source_kind,
            status: RunStatus::Success,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            urls: Vec::new(),
            items_fetched: 0,
            iocs_extracted: 0,
            iocs_created: 0,
            iocs_updated: 0,
            iocs_unchanged: 0,
            error_count: 0,
            errors: Vec::new(),
            created_at: now,
        }
    }

    /// Record a recovered error and keep going.
    pub fn record_error(&mut self, err: &Error) {
        self.error_count += 1;
        self.errors.push(HistoryError::from(err));
    }

    /// Close the record: stamps completion time, duration and final status.
    pub fn finish(&mut self) {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at).num_milliseconds();
        self.status = RunStatus::determine(self.items_fetched, self.error_count);
    }

    /// History for a run that failed outright before any items were handled.
    pub fn failure(source_id: impl Into<String>, source_kind: SourceKind, err: &Error) -> Self {
        let mut history = Self::begin(source_id, source_kind);
        history.record_error(err);
        history.finish();
        history.status = RunStatus::Failure;
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_determination() {
        assert_eq!(RunStatus::determine(10, 0), RunStatus::Success);
        assert_eq!(RunStatus::determine(0, 0), RunStatus::Success);
        assert_eq!(RunStatus::determine(0, 3), RunStatus::Failure);
        assert_eq!(RunStatus::determine(7, 2), RunStatus::Partial);
    }

    #[test]
    fn test_history_ids_are_time_sortable() {
        let a = History::begin("s1", SourceKind::Feed);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = History::begin("s1", SourceKind::Feed);
        assert_ne!(a.id, b.id);
        // UUIDv7 sorts by creation time
        assert!(a.id < b.id);
    }

    #[test]
    fn test_failure_history() {
        let err = Error::fetch("boom").with("url", "https://feed.example/x");
        let history = History::failure("f1", SourceKind::Feed, &err);
        assert_eq!(history.status, RunStatus::Failure);
        assert_eq!(history.error_count, 1);
        assert_eq!(history.errors[0].values.get("url").unwrap(), "https://feed.example/x");
    }
}
