//! Wire representation for a durable document backend
//!
//! Three logical collections: `iocs/<id>`, `sources/<source_id>`, and
//! `sources/<source_id>/histories/<history_id>`. The durable backend must
//! keep a vector index on `iocs.embedding` with the configured dimension;
//! nearest-neighbor queries use cosine distance.

use std::str::FromStr;

use beehive_common::{
    Error, History, HistoryError, Ioc, IocStatus, IocType, Result, RunStatus, SourceKind,
    SourceState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const IOC_COLLECTION: &str = "iocs";
pub const SOURCE_COLLECTION: &str = "sources";
pub const HISTORY_SUBCOLLECTION: &str = "histories";

/// `iocs/<id>`
pub fn ioc_path(id: &str) -> String {
    format!("{IOC_COLLECTION}/{id}")
}

/// `sources/<source_id>`
pub fn source_path(source_id: &str) -> String {
    format!("{SOURCE_COLLECTION}/{source_id}")
}

/// `sources/<source_id>/histories/<history_id>`
pub fn history_path(source_id: &str, history_id: &str) -> String {
    format!("{SOURCE_COLLECTION}/{source_id}/{HISTORY_SUBCOLLECTION}/{history_id}")
}

/// Stored form of an IoC. Enums travel as their wire strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IocDoc {
    pub id: String,
    pub source_id: String,
    pub source_kind: String,
    pub ioc_type: String,
    pub value: String,
    pub description: String,
    pub source_url: String,
    pub context: String,
    pub embedding: Vec<f32>,
    pub status: String,
    pub first_seen: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ioc> for IocDoc {
    fn from(ioc: &Ioc) -> Self {
        Self {
            id: ioc.id.clone(),
            source_id: ioc.source_id.clone(),
            source_kind: ioc.source_kind.to_string(),
            ioc_type: ioc.ioc_type.to_string(),
            value: ioc.value.clone(),
            description: ioc.description.clone(),
            source_url: ioc.source_url.clone(),
            context: ioc.context.clone(),
            embedding: ioc.embedding.clone(),
            status: ioc.status.to_string(),
            first_seen: ioc.first_seen,
            updated_at: ioc.updated_at,
        }
    }
}

impl TryFrom<IocDoc> for Ioc {
    type Error = Error;

    fn try_from(doc: IocDoc) -> Result<Self> {
        let source_kind = match doc.source_kind.as_str() {
            "rss" => SourceKind::Rss,
            "feed" => SourceKind::Feed,
            other => {
                return Err(Error::storage(format!("unknown source kind: {other}"))
                    .with("id", &doc.id))
            }
        };
        let status = match doc.status.as_str() {
            "active" => IocStatus::Active,
            "inactive" => IocStatus::Inactive,
            other => {
                return Err(
                    Error::storage(format!("unknown IoC status: {other}")).with("id", &doc.id)
                )
            }
        };
        Ok(Self {
            ioc_type: IocType::from_str(&doc.ioc_type)?,
            id: doc.id,
            source_id: doc.source_id,
            source_kind,
            value: doc.value,
            description: doc.description,
            source_url: doc.source_url,
            context: doc.context,
            embedding: doc.embedding,
            status,
            first_seen: doc.first_seen,
            updated_at: doc.updated_at,
        })
    }
}

/// Stored form of per-source state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStateDoc {
    pub source_id: String,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub last_item_id: String,
    pub last_item_date: Option<DateTime<Utc>>,
    pub item_count: u64,
    pub error_count: u64,
    pub last_error: String,
    pub last_status: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SourceState> for SourceStateDoc {
    fn from(state: &SourceState) -> Self {
        Self {
            source_id: state.source_id.clone(),
            last_fetched_at: state.last_fetched_at,
            last_item_id: state.last_item_id.clone(),
            last_item_date: state.last_item_date,
            item_count: state.item_count,
            error_count: state.error_count,
            last_error: state.last_error.clone(),
            last_status: state.last_status.map(|s| s.to_string()),
            updated_at: state.updated_at,
        }
    }
}

impl TryFrom<SourceStateDoc> for SourceState {
    type Error = Error;

    fn try_from(doc: SourceStateDoc) -> Result<Self> {
        let last_status = match doc.last_status.as_deref() {
            None => None,
            Some("success") => Some(RunStatus::Success),
            Some("partial") => Some(RunStatus::Partial),
            Some("failure") => Some(RunStatus::Failure),
            Some(other) => {
                return Err(Error::storage(format!("unknown run status: {other}"))
                    .with("source_id", &doc.source_id))
            }
        };
        Ok(Self {
            source_id: doc.source_id,
            last_fetched_at: doc.last_fetched_at,
            last_item_id: doc.last_item_id,
            last_item_date: doc.last_item_date,
            item_count: doc.item_count,
            error_count: doc.error_count,
            last_error: doc.last_error,
            last_status,
            updated_at: doc.updated_at,
        })
    }
}

/// Stored form of one run history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDoc {
    pub id: String,
    pub source_id: String,
    pub source_kind: String,
    pub status: String,
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

impl From<&History> for HistoryDoc {
    fn from(history: &History) -> Self {
        Self {
            id: history.id.clone(),
            source_id: history.source_id.clone(),
            source_kind: history.source_kind.to_string(),
            status: history.status.to_string(),
            started_at: history.started_at,
            completed_at: history.completed_at,
            duration_ms: history.duration_ms,
            urls: history.urls.clone(),
            items_fetched: history.items_fetched,
            iocs_extracted: history.iocs_extracted,
            iocs_created: history.iocs_created,
            iocs_updated: history.iocs_updated,
            iocs_unchanged: history.iocs_unchanged,
            error_count: history.error_count,
            errors: history.errors.clone(),
            created_at: history.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beehive_common::{generate_id, normalize};

    #[test]
    fn test_paths() {
        assert_eq!(ioc_path("ioc_ab"), "iocs/ioc_ab");
        assert_eq!(source_path("blog1"), "sources/blog1");
        assert_eq!(
            history_path("blog1", "h1"),
            "sources/blog1/histories/h1"
        );
    }

    #[test]
    fn test_ioc_doc_round_trip() {
        let value = normalize(IocType::Domain, "Evil.Example.COM");
        let ioc = Ioc {
            id: generate_id("s1", IocType::Domain, &value, ""),
            source_id: "s1".into(),
            source_kind: SourceKind::Rss,
            ioc_type: IocType::Domain,
            value,
            description: "C2 domain".into(),
            source_url: "https://blog.example/post".into(),
            context: "seen in campaign writeup".into(),
            embedding: vec![0.25; 128],
            status: IocStatus::Active,
            first_seen: Utc::now(),
            updated_at: Utc::now(),
        };

        let doc = IocDoc::from(&ioc);
        assert_eq!(doc.ioc_type, "domain");
        assert_eq!(doc.source_kind, "rss");
        assert_eq!(doc.status, "active");

        let back = Ioc::try_from(doc).unwrap();
        assert_eq!(back.id, ioc.id);
        assert_eq!(back.ioc_type, IocType::Domain);
        assert_eq!(back.status, IocStatus::Active);
    }

    #[test]
    fn test_ioc_doc_rejects_unknown_enum_strings() {
        let ioc = Ioc {
            id: "ioc_x".into(),
            source_id: "s1".into(),
            source_kind: SourceKind::Feed,
            ioc_type: IocType::IPv4,
            value: "192.0.2.1".into(),
            description: String::new(),
            source_url: String::new(),
            context: String::new(),
            embedding: Vec::new(),
            status: IocStatus::Active,
            first_seen: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut doc = IocDoc::from(&ioc);
        doc.status = "zombie".into();
        assert!(Ioc::try_from(doc).is_err());
    }
}
