//! Beehive Common Types
//!
//! Shared domain model for the beehive threat intelligence core:
//! IoC records and their identity rules, per-source fetch state, per-run
//! history, and the crate-wide error taxonomy.
//!
//! # Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      INGESTION CORE                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ ┌──────────┐   ┌──────────┐                                  │
//! │ │ RSS blogs│   │  Threat  │  ... Sources                     │
//! │ └────┬─────┘   │  feeds   │                                  │
//! │      │         └────┬─────┘                                  │
//! │      └──────────────┼──────────┐                             │
//! │                     ▼          ▼                             │
//! │        ┌────────────────────────────┐                        │
//! │        │      Fetch Orchestrator    │                        │
//! │        └─────────────┬──────────────┘                        │
//! │                      ▼                                       │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │                  IoC Store                          │      │
//! │  │  IPs | Domains | URLs | Hashes | Emails | ...      │      │
//! │  │  + embeddings, per-source state, run histories     │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod history;
pub mod identity;
pub mod ioc;
pub mod state;

pub use error::{ContextValues, Error, Result};
pub use history::{History, HistoryError, RunStatus};
pub use identity::{context_key, generate_id};
pub use ioc::{detect_ioc_type, normalize, Ioc, IocStatus, IocType, SourceKind};
pub use state::SourceState;

/// Default dimension of IoC embedding vectors.
pub const EMBEDDING_DIM: usize = 128;
