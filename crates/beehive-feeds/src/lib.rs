//! Structured threat feed parsing
//!
//! A schema registry maps a schema tag (e.g. `abuse_ch_urlhaus`) to a parser
//! shape, a default endpoint and default tags. The 40+ registered schemas
//! share five parser shapes: two column-mapped CSVs (URLhaus, ThreatFox), a
//! generic single-column CSV with type auto-detection, a newline-delimited
//! IP list, and a newline-delimited mixed IoC list.

pub mod csv_feed;
pub mod entry;
pub mod fetch;
pub mod iplist;
pub mod mixed;
pub mod registry;

use beehive_common::Result;

pub use entry::FeedEntry;
pub use fetch::{feed_client, fetch_feed};
pub use registry::{all_schemas, lookup, ParserKind, SchemaSpec};

/// Parse a fetched feed document according to its schema.
///
/// Per-line issues are skipped; only structural failures (e.g. an
/// unterminated CSV quote) fail the whole feed.
pub fn parse(spec: &SchemaSpec, content: &str) -> Result<Vec<FeedEntry>> {
    match spec.parser {
        ParserKind::UrlhausCsv => csv_feed::parse_urlhaus(content),
        ParserKind::ThreatfoxCsv => csv_feed::parse_threatfox(content),
        ParserKind::GenericCsv { value_column } => csv_feed::parse_generic(content, value_column),
        ParserKind::IpList => iplist::parse(content),
        ParserKind::MixedList => mixed::parse(content),
    }
}
