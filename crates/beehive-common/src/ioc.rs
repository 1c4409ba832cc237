//! IoC record, semantic types, normalization and type auto-detection

use std::net::IpAddr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic type of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IocType {
    #[serde(rename = "ipv4")]
    IPv4,
    #[serde(rename = "ipv6")]
    IPv6,
    #[serde(rename = "domain")]
    Domain,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "mac-addr")]
    MacAddr,
    #[serde(rename = "asn")]
    Asn,
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "filename")]
    Filename,
    #[serde(rename = "process")]
    Process,
    #[serde(rename = "mutex")]
    Mutex,
    #[serde(rename = "registry-key")]
    RegistryKey,
    #[serde(rename = "user-agent")]
    UserAgent,
    #[serde(rename = "cert-hash")]
    CertHash,
}

impl IocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IPv4 => "ipv4",
            Self::IPv6 => "ipv6",
            Self::Domain => "domain",
            Self::Url => "url",
            Self::Email => "email",
            Self::MacAddr => "mac-addr",
            Self::Asn => "asn",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Filename => "filename",
            Self::Process => "process",
            Self::Mutex => "mutex",
            Self::RegistryKey => "registry-key",
            Self::UserAgent => "user-agent",
            Self::CertHash => "cert-hash",
        }
    }
}

impl std::fmt::Display for IocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ipv4" => Ok(Self::IPv4),
            "ipv6" => Ok(Self::IPv6),
            "domain" => Ok(Self::Domain),
            "url" => Ok(Self::Url),
            "email" => Ok(Self::Email),
            "mac-addr" => Ok(Self::MacAddr),
            "asn" => Ok(Self::Asn),
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "filename" => Ok(Self::Filename),
            "process" => Ok(Self::Process),
            "mutex" => Ok(Self::Mutex),
            "registry-key" => Ok(Self::RegistryKey),
            "user-agent" => Ok(Self::UserAgent),
            "cert-hash" => Ok(Self::CertHash),
            other => Err(Error::validation(format!("unknown IoC type: {other}"))
                .with("type", other)),
        }
    }
}

/// Kind of source an IoC came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "rss")]
    Rss,
    #[serde(rename = "feed")]
    Feed,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Feed => "feed",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an IoC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IocStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "inactive")]
    Inactive,
}

impl std::fmt::Display for IocStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Indicator of Compromise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ioc {
    pub id: String,
    pub source_id: String,
    pub source_kind: SourceKind,
    pub ioc_type: IocType,
    pub value: String,
    pub description: String,
    pub source_url: String,
    pub context: String,
    pub embedding: Vec<f32>,
    pub status: IocStatus,
    pub first_seen: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ioc {
    /// Precondition for any upsert.
    pub fn validate(&self, embedding_dim: usize) -> Result<()> {
        if self.source_id.is_empty() {
            return Err(Error::validation("IoC source_id is empty").with("id", &self.id));
        }
        if self.value.is_empty() {
            return Err(Error::validation("IoC value is empty")
                .with("id", &self.id)
                .with("source_id", &self.source_id));
        }
        if !self.embedding.is_empty() && self.embedding.len() != embedding_dim {
            return Err(Error::validation(format!(
                "IoC embedding has {} dimensions, expected {embedding_dim}",
                self.embedding.len()
            ))
            .with("id", &self.id)
            .with("source_id", &self.source_id));
        }
        Ok(())
    }

    /// True when the mutable fields compared by upsert differ.
    pub fn differs_from(&self, other: &Ioc) -> bool {
        self.description != other.description
            || self.status != other.status
            || self.source_url != other.source_url
            || self.context != other.context
    }
}

/// Canonical textual form of a value, by type. Idempotent.
pub fn normalize(ioc_type: IocType, value: &str) -> String {
    let trimmed = value.trim();
    match ioc_type {
        IocType::IPv4 | IocType::IPv6 => match trimmed.parse::<IpAddr>() {
            Ok(ip) => ip.to_string(),
            Err(_) => trimmed.to_lowercase(),
        },
        IocType::Domain => trimmed
            .to_lowercase()
            .strip_suffix('.')
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_lowercase()),
        IocType::Url => match url::Url::parse(trimmed) {
            Ok(u) => u.to_string(),
            Err(_) => trimmed.to_string(),
        },
        IocType::Email | IocType::Md5 | IocType::Sha1 | IocType::Sha256 | IocType::CertHash => {
            trimmed.to_lowercase()
        }
        IocType::MacAddr => trimmed.to_lowercase().replace([':', '-'], ""),
        IocType::Asn => {
            let upper = trimmed.to_uppercase();
            match upper.strip_prefix("AS") {
                Some(rest) => rest.trim().to_string(),
                None => trimmed.to_string(),
            }
        }
        _ => trimmed.to_string(),
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

fn domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}$").unwrap()
    })
}

/// Auto-detect the semantic type of a raw value.
///
/// Priority order: SHA-256, SHA-1, MD5 (hex length), IP parse, URL with
/// scheme and host, email, domain; anything else is treated as a filename.
pub fn detect_ioc_type(value: &str) -> IocType {
    let v = value.trim();

    if v.chars().all(|c| c.is_ascii_hexdigit()) {
        match v.len() {
            64 => return IocType::Sha256,
            40 => return IocType::Sha1,
            32 => return IocType::Md5,
            _ => {}
        }
    }

    if let Ok(ip) = v.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(_) => IocType::IPv4,
            IpAddr::V6(_) => IocType::IPv6,
        };
    }

    if let Ok(u) = url::Url::parse(v) {
        if u.has_host() && !u.scheme().is_empty() {
            return IocType::Url;
        }
    }

    if email_re().is_match(v) {
        return IocType::Email;
    }

    if domain_re().is_match(v) {
        return IocType::Domain;
    }

    IocType::Filename
}
