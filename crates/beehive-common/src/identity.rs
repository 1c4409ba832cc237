//! Deterministic IoC identity
//!
//! An IoC id is derived from (source, type, normalized value, context key).
//! The context key decides what "the same IoC" means per source kind, so the
//! same value observed in two different articles stays two records while a
//! feed re-reporting an IP collapses to one.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::ioc::IocType;

/// Parameters considered when deriving a context key.
pub type ContextParams = BTreeMap<String, String>;

/// Derive the context key for a source kind.
///
/// - `feed`: the entry id when the feed exposes one, else empty; feeds
///   without ids collapse repeated values.
/// - `rss`: article GUID, else article URL, else empty; the same value in
///   different articles yields distinct records.
/// - any other kind: lexicographically sorted `k=v` pairs joined with `&`.
pub fn context_key(kind: &str, params: &ContextParams) -> String {
    match kind {
        "feed" => params.get("entry_id").cloned().unwrap_or_default(),
        "rss" => params
            .get("article_guid")
            .filter(|g| !g.is_empty())
            .or_else(|| params.get("article_url").filter(|u| !u.is_empty()))
            .cloned()
            .unwrap_or_default(),
        _ => params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"),
    }
}

/// Deterministic IoC identifier: first 128 bits of
/// SHA-256("<sourceID>:<type>:<normalizedValue>:<contextKey>"), hex encoded,
/// prefixed with `ioc_`.
pub fn generate_id(source_id: &str, ioc_type: IocType, value: &str, context_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(b":");
    hasher.update(ioc_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    hasher.update(b":");
    hasher.update(context_key.as_bytes());
    let digest = hasher.finalize();
    format!("ioc_{}", hex::encode(&digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_deterministic() {
        let a = generate_id("s1", IocType::IPv4, "192.0.2.1", "entry-7");
        let b = generate_id("s1", IocType::IPv4, "192.0.2.1", "entry-7");
        assert_eq!(a, b);
        assert!(a.starts_with("ioc_"));
        // 128 bits -> 32 hex chars
        assert_eq!(a.len(), "ioc_".len() + 32);
    }

    #[test]
    fn test_generate_id_distinguishes_context() {
        let a = generate_id("s1", IocType::IPv4, "192.0.2.1", "entry-7");
        let b = generate_id("s1", IocType::IPv4, "192.0.2.1", "entry-8");
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_key_feed() {
        let mut params = ContextParams::new();
        assert_eq!(context_key("feed", &params), "");

        params.insert("entry_id".into(), "3741935".into());
        assert_eq!(context_key("feed", &params), "3741935");
    }

    #[test]
    fn test_context_key_rss() {
        let mut params = ContextParams::new();
        params.insert("article_url".into(), "https://blog.example/post".into());
        assert_eq!(context_key("rss", &params), "https://blog.example/post");

        params.insert("article_guid".into(), "guid-1".into());
        assert_eq!(context_key("rss", &params), "guid-1");

        // empty GUID falls through to the URL
        params.insert("article_guid".into(), String::new());
        assert_eq!(context_key("rss", &params), "https://blog.example/post");
    }

    #[test]
    fn test_context_key_unknown_kind() {
        let mut params = ContextParams::new();
        params.insert("b".into(), "2".into());
        params.insert("a".into(), "1".into());
        assert_eq!(context_key("custom", &params), "a=1&b=2");
    }
}
