//! Error types for the beehive core

use std::collections::BTreeMap;
use thiserror::Error;

/// Structured context attached to an error (`source_id`, `url`, `schema`, ...).
pub type ContextValues = BTreeMap<String, String>;

/// Beehive error type
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Invalid input
    #[error("validation error: {message}")]
    Validation {
        message: String,
        values: ContextValues,
    },

    /// HTTP failure, non-200 status, network timeout
    #[error("fetch error: {message}")]
    Fetch {
        message: String,
        values: ContextValues,
    },

    /// Malformed CSV, unparseable feed XML or HTML
    #[error("parse error: {message}")]
    Parse {
        message: String,
        values: ContextValues,
    },

    /// LLM call failure, empty response, response failing the schema
    #[error("extraction error: {message}")]
    Extraction {
        message: String,
        values: ContextValues,
    },

    /// Backend read/write failure
    #[error("storage error: {message}")]
    Storage {
        message: String,
        values: ContextValues,
    },

    /// Configuration validation failure
    #[error("config error: {message}")]
    Config {
        message: String,
        values: ContextValues,
    },
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            values: ContextValues::new(),
        }
    }

    /// Attach a context value. Chainable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Self::NotFound { .. } => {}
            Self::Validation { values, .. }
            | Self::Fetch { values, .. }
            | Self::Parse { values, .. }
            | Self::Extraction { values, .. }
            | Self::Storage { values, .. }
            | Self::Config { values, .. } => {
                values.insert(key.into(), value.into());
            }
        }
        self
    }

    /// Structured context values carried by this error.
    pub fn values(&self) -> ContextValues {
        match self {
            Self::NotFound { kind, id } => {
                let mut v = ContextValues::new();
                v.insert("kind".to_string(), kind.to_string());
                v.insert("id".to_string(), id.clone());
                v
            }
            Self::Validation { values, .. }
            | Self::Fetch { values, .. }
            | Self::Parse { values, .. }
            | Self::Extraction { values, .. }
            | Self::Storage { values, .. }
            | Self::Config { values, .. } => values.clone(),
        }
    }
}

/// Result type for the beehive core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_values() {
        let err = Error::fetch("connection refused")
            .with("source_id", "blog1")
            .with("url", "https://example.com/feed.xml");

        let values = err.values();
        assert_eq!(values.get("source_id").unwrap(), "blog1");
        assert_eq!(values.get("url").unwrap(), "https://example.com/feed.xml");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_not_found_values() {
        let err = Error::not_found("ioc", "ioc_deadbeef");
        let values = err.values();
        assert_eq!(values.get("kind").unwrap(), "ioc");
        assert_eq!(values.get("id").unwrap(), "ioc_deadbeef");
    }
}
