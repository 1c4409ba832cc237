//! Newline-delimited mixed IoC list parser

use beehive_common::{detect_ioc_type, IocType, Result};
use tracing::debug;

use crate::entry::FeedEntry;

/// One value per line, types auto-detected. Lines that only resolve to the
/// filename fallback carry no signal in a threat list and are skipped.
pub fn parse(content: &str) -> Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();
    let mut unrecognized = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ioc_type = detect_ioc_type(line);
        if ioc_type == IocType::Filename {
            unrecognized += 1;
            continue;
        }
        entries.push(FeedEntry::new(ioc_type, line));
    }

    if unrecognized > 0 {
        debug!(unrecognized, "skipped unrecognized mixed list lines");
    }
    Ok(entries)
}
