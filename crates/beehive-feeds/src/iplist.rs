//! Newline-delimited IP list parser

use std::net::IpAddr;

use beehive_common::{IocType, Result};
use tracing::debug;

use crate::entry::FeedEntry;

/// One IP per line; `#` comments and blank lines are skipped, malformed
/// lines are dropped silently. Tags come from the caller.
pub fn parse(content: &str) -> Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => entries.push(FeedEntry::new(IocType::IPv4, ip.to_string())),
            Ok(IpAddr::V6(ip)) => entries.push(FeedEntry::new(IocType::IPv6, ip.to_string())),
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        debug!(malformed, "dropped unparsable IP list lines");
    }
    Ok(entries)
}
