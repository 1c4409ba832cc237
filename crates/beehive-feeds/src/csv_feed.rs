//! Column-mapped CSV feed parsers
//!
//! Tolerant by design: rows with fewer fields than the schema minimum and
//! cells that fail to parse are skipped or defaulted, while structural CSV
//! errors (e.g. an unterminated quote) fail the whole feed.

use beehive_common::{detect_ioc_type, Error, IocType, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::entry::FeedEntry;

/// URLhaus layout: id, dateadded, url, url_status, last_online, threat,
/// tags, urlhaus_link, reporter.
const URLHAUS_MIN_FIELDS: usize = 7;

/// ThreatFox layout: first_seen_utc, ioc_id, ioc_value, ioc_type,
/// threat_type, fk_malware, malware_alias, malware_printable,
/// last_seen_utc, confidence_level, reference, tags, anonymous, reporter.
const THREATFOX_MIN_FIELDS: usize = 12;

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn structural_error(err: csv::Error) -> Error {
    Error::parse(format!("CSV structure error: {err}"))
}

/// Parse a timestamp cell against the candidate formats; falls back to the
/// current time rather than failing the feed.
pub fn parse_feed_timestamp(value: &str) -> DateTime<Utc> {
    let v = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(v, format) {
            return naive.and_utc();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive.and_utc();
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(v) {
        return parsed.with_timezone(&Utc);
    }
    Utc::now()
}

fn split_tags(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// abuse.ch URLhaus CSV.
pub fn parse_urlhaus(content: &str) -> Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for record in reader(content).records() {
        let record = record.map_err(structural_error)?;
        if record.len() < URLHAUS_MIN_FIELDS {
            skipped += 1;
            continue;
        }
        let value = record[2].to_string();
        if value.is_empty() {
            skipped += 1;
            continue;
        }

        let first_seen = parse_feed_timestamp(&record[1]);
        let last_online = record.get(4).unwrap_or_default();
        let last_seen = if last_online.is_empty() {
            first_seen
        } else {
            parse_feed_timestamp(last_online)
        };

        entries.push(FeedEntry {
            id: record[0].to_string(),
            ioc_type: IocType::Url,
            value,
            description: format!("URLhaus: {}", &record[5]),
            tags: split_tags(&record[6]),
            first_seen,
            last_seen,
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped short URLhaus rows");
    }
    Ok(entries)
}

/// ThreatFox ioc_type column mapping; anything else falls back to
/// auto-detection.
fn threatfox_type(ioc_type: &str, value: &str) -> IocType {
    match ioc_type {
        "ip:port" | "ip" => IocType::IPv4,
        "domain" => IocType::Domain,
        "url" => IocType::Url,
        "md5_hash" => IocType::Md5,
        "sha1_hash" => IocType::Sha1,
        "sha256_hash" => IocType::Sha256,
        "email" => IocType::Email,
        _ => detect_ioc_type(value),
    }
}

/// abuse.ch ThreatFox CSV export.
pub fn parse_threatfox(content: &str) -> Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for record in reader(content).records() {
        let record = record.map_err(structural_error)?;
        if record.len() < THREATFOX_MIN_FIELDS {
            skipped += 1;
            continue;
        }
        let value = record[2].to_string();
        if value.is_empty() {
            skipped += 1;
            continue;
        }

        let first_seen = parse_feed_timestamp(&record[0]);
        let last_cell = record.get(8).unwrap_or_default();
        let last_seen = if last_cell.is_empty() {
            first_seen
        } else {
            parse_feed_timestamp(last_cell)
        };

        entries.push(FeedEntry {
            id: record[1].to_string(),
            ioc_type: threatfox_type(&record[3], &value),
            value,
            description: format!("{} ({})", &record[7], &record[4]),
            tags: split_tags(&record[11]),
            first_seen,
            last_seen,
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped short ThreatFox rows");
    }
    Ok(entries)
}

/// Single meaningful column, type auto-detected; lines whose value cannot
/// be recognized as a network observable are skipped.
pub fn parse_generic(content: &str, value_column: usize) -> Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();

    for record in reader(content).records() {
        let record = record.map_err(structural_error)?;
        let Some(value) = record.get(value_column) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let ioc_type = detect_ioc_type(value);
        if ioc_type == IocType::Filename {
            continue;
        }
        entries.push(FeedEntry::new(ioc_type, value));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const URLHAUS_SAMPLE: &str = concat!(
        "# URLhaus database dump\n",
        "# id,dateadded,url,url_status,last_online,threat,tags,urlhaus_link,reporter\n",
        "\"3741935\",\"2025-12-24 07:20:09\",\"https://sivqen.a8riculmarb1e.ru/0dh149h0\",\"online\",\"2025-12-24 09:00:00\",\"malware_download\",\"ClearFake\",\"https://urlhaus.abuse.ch/url/3741935/\",\"reporter\"\n",
        "\"too\",\"short\"\n",
    );

    #[test]
    fn test_parse_urlhaus_line() {
        let entries = parse_urlhaus(URLHAUS_SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.id, "3741935");
        assert_eq!(entry.ioc_type, IocType::Url);
        assert_eq!(entry.value, "https://sivqen.a8riculmarb1e.ru/0dh149h0");
        assert!(entry.description.contains("malware_download"));
        assert_eq!(entry.tags, vec!["ClearFake".to_string()]);
        assert_eq!(
            entry.first_seen,
            Utc.with_ymd_and_hms(2025, 12, 24, 7, 20, 9).unwrap()
        );
    }

    #[test]
    fn test_parse_threatfox_row() {
        let row = "\"2025-11-02 13:37:00\",\"1199409\",\"45.32.211.159:51515\",\"ip:port\",\"botnet_cc\",\"win.mirai\",\"\",\"Mirai\",\"\",\"75\",\"\",\"mirai\",\"0\",\"abuse_ch\"\n";
        let entries = parse_threatfox(row).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.ioc_type, IocType::IPv4);
        assert_eq!(entry.value, "45.32.211.159:51515");
        assert!(entry.description.contains("Mirai"));
        assert!(entry.description.contains("botnet_cc"));
        assert_eq!(entry.tags, vec!["mirai".to_string()]);
        // empty last_seen falls back to first_seen
        assert_eq!(entry.last_seen, entry.first_seen);
    }

    #[test]
    fn test_threatfox_type_table() {
        assert_eq!(threatfox_type("ip:port", "1.2.3.4:80"), IocType::IPv4);
        assert_eq!(threatfox_type("domain", "evil.example"), IocType::Domain);
        assert_eq!(threatfox_type("sha256_hash", "xx"), IocType::Sha256);
        // unknown type string auto-detects from the value
        assert_eq!(
            threatfox_type("mystery", "https://evil.example/x"),
            IocType::Url
        );
    }

    #[test]
    fn test_short_rows_are_skipped_not_fatal() {
        let content = "\"1\",\"2\"\n";
        assert!(parse_urlhaus(content).unwrap().is_empty());
        assert!(parse_threatfox(content).unwrap().is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let content = "# header comment\n\n# another\n";
        assert!(parse_urlhaus(content).unwrap().is_empty());
        assert!(parse_threatfox(content).unwrap().is_empty());
    }

    #[test]
    fn test_parse_generic_auto_detect() {
        let content = "evil.example.com,103.224.182.253\n# comment\n192.0.2.7,x\n,,\n";
        let entries = parse_generic(content, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ioc_type, IocType::Domain);
        assert_eq!(entries[1].ioc_type, IocType::IPv4);
        assert!(entries[0].id.is_empty());
    }

    #[test]
    fn test_timestamp_candidates() {
        for (input, expected) in [
            ("2025-12-24 07:20:09", (2025, 12, 24, 7, 20, 9)),
            ("2025-12-24T07:20:09Z", (2025, 12, 24, 7, 20, 9)),
            ("2025-12-24T07:20:09", (2025, 12, 24, 7, 20, 9)),
            ("2025-12-24", (2025, 12, 24, 0, 0, 0)),
        ] {
            let (y, mo, d, h, mi, s) = expected;
            assert_eq!(
                parse_feed_timestamp(input),
                Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap(),
                "{input}"
            );
        }

        let rfc = parse_feed_timestamp("2025-12-24T07:20:09+02:00");
        assert_eq!(rfc, Utc.with_ymd_and_hms(2025, 12, 24, 5, 20, 9).unwrap());

        // garbage falls back to now, not an error
        let fallback = parse_feed_timestamp("not a date");
        assert!(fallback <= Utc::now());
    }
}
