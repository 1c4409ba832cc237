//! Feed schema registry
//!
//! One table row per schema instead of one parser per URL: each row names
//! its parser shape, default endpoint and default tags. Callers may override
//! the URL per source in configuration.

/// Parser shape shared by many schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// abuse.ch URLhaus CSV column layout.
    UrlhausCsv,
    /// abuse.ch ThreatFox CSV column layout.
    ThreatfoxCsv,
    /// One meaningful column, type auto-detected.
    GenericCsv { value_column: usize },
    /// Newline-delimited IPs with `#` comments.
    IpList,
    /// Newline-delimited mixed IoCs, types auto-detected.
    MixedList,
}

/// Registry row for one feed schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaSpec {
    pub name: &'static str,
    pub parser: ParserKind,
    pub default_url: &'static str,
    pub default_tags: &'static [&'static str],
}

/// All registered schemas.
pub fn all_schemas() -> &'static [SchemaSpec] {
    SCHEMAS
}

/// Look up a schema by its tag.
pub fn lookup(name: &str) -> Option<&'static SchemaSpec> {
    SCHEMAS.iter().find(|s| s.name == name)
}

static SCHEMAS: &[SchemaSpec] = &[
    // abuse.ch
    SchemaSpec {
        name: "abuse_ch_urlhaus",
        parser: ParserKind::UrlhausCsv,
        default_url: "https://urlhaus.abuse.ch/downloads/csv_recent/",
        default_tags: &["abuse.ch", "urlhaus"],
    },
    SchemaSpec {
        name: "abuse_ch_threatfox",
        parser: ParserKind::ThreatfoxCsv,
        default_url: "https://threatfox.abuse.ch/export/csv/recent/",
        default_tags: &["abuse.ch", "threatfox"],
    },
    SchemaSpec {
        name: "abuse_ch_feodotracker",
        parser: ParserKind::IpList,
        default_url: "https://feodotracker.abuse.ch/downloads/ipblocklist.txt",
        default_tags: &["abuse.ch", "feodotracker", "botnet", "c2"],
    },
    SchemaSpec {
        name: "abuse_ch_sslbl",
        parser: ParserKind::IpList,
        default_url: "https://sslbl.abuse.ch/blacklist/sslipblacklist.txt",
        default_tags: &["abuse.ch", "sslbl", "c2"],
    },
    // blocklist.de
    SchemaSpec {
        name: "blocklist_de_all",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/all.txt",
        default_tags: &["blocklist.de"],
    },
    SchemaSpec {
        name: "blocklist_de_ssh",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/ssh.txt",
        default_tags: &["blocklist.de", "ssh"],
    },
    SchemaSpec {
        name: "blocklist_de_mail",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/mail.txt",
        default_tags: &["blocklist.de", "mail"],
    },
    SchemaSpec {
        name: "blocklist_de_apache",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/apache.txt",
        default_tags: &["blocklist.de", "apache"],
    },
    SchemaSpec {
        name: "blocklist_de_imap",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/imap.txt",
        default_tags: &["blocklist.de", "imap"],
    },
    SchemaSpec {
        name: "blocklist_de_ftp",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/ftp.txt",
        default_tags: &["blocklist.de", "ftp"],
    },
    SchemaSpec {
        name: "blocklist_de_sip",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/sip.txt",
        default_tags: &["blocklist.de", "sip"],
    },
    SchemaSpec {
        name: "blocklist_de_bots",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/bots.txt",
        default_tags: &["blocklist.de", "bots"],
    },
    SchemaSpec {
        name: "blocklist_de_strongips",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/strongips.txt",
        default_tags: &["blocklist.de", "strongips"],
    },
    SchemaSpec {
        name: "blocklist_de_bruteforcelogin",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/bruteforcelogin.txt",
        default_tags: &["blocklist.de", "bruteforce"],
    },
    SchemaSpec {
        name: "blocklist_de_ircbot",
        parser: ParserKind::IpList,
        default_url: "https://lists.blocklist.de/lists/ircbot.txt",
        default_tags: &["blocklist.de", "ircbot"],
    },
    // IPsum aggregated levels (level = number of corroborating blocklists)
    SchemaSpec {
        name: "ipsum_level_1",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/1.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_2",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/2.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_3",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/3.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_4",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/4.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_5",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/5.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_6",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/6.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_7",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/7.txt",
        default_tags: &["ipsum"],
    },
    SchemaSpec {
        name: "ipsum_level_8",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/8.txt",
        default_tags: &["ipsum"],
    },
    // C2IntelFeeds
    SchemaSpec {
        name: "c2intelfeeds_domains",
        parser: ParserKind::GenericCsv { value_column: 0 },
        default_url:
            "https://raw.githubusercontent.com/drb-ra/C2IntelFeeds/master/feeds/domainC2s.csv",
        default_tags: &["c2intelfeeds", "c2"],
    },
    SchemaSpec {
        name: "c2intelfeeds_ips",
        parser: ParserKind::GenericCsv { value_column: 0 },
        default_url:
            "https://raw.githubusercontent.com/drb-ra/C2IntelFeeds/master/feeds/IPC2s.csv",
        default_tags: &["c2intelfeeds", "c2"],
    },
    // montysecurity C2 tracker
    SchemaSpec {
        name: "montysecurity_c2_all",
        parser: ParserKind::IpList,
        default_url:
            "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/all.txt",
        default_tags: &["montysecurity", "c2"],
    },
    SchemaSpec {
        name: "montysecurity_cobaltstrike",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/Cobalt%20Strike%20C2%20IPs.txt",
        default_tags: &["montysecurity", "c2", "cobaltstrike"],
    },
    SchemaSpec {
        name: "montysecurity_metasploit",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/Metasploit%20Framework%20C2%20IPs.txt",
        default_tags: &["montysecurity", "c2", "metasploit"],
    },
    SchemaSpec {
        name: "montysecurity_sliver",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/Sliver%20C2%20IPs.txt",
        default_tags: &["montysecurity", "c2", "sliver"],
    },
    SchemaSpec {
        name: "montysecurity_havoc",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/Havoc%20C2%20IPs.txt",
        default_tags: &["montysecurity", "c2", "havoc"],
    },
    SchemaSpec {
        name: "montysecurity_brute_ratel",
        parser: ParserKind::IpList,
        default_url: "https://raw.githubusercontent.com/montysecurity/C2-Tracker/main/data/Brute%20Ratel%20C4%20IPs.txt",
        default_tags: &["montysecurity", "c2", "bruteratel"],
    },
    // ThreatView high-confidence feeds
    SchemaSpec {
        name: "threatview_ip",
        parser: ParserKind::IpList,
        default_url: "https://threatview.io/Downloads/IP-High-Confidence-Feed.txt",
        default_tags: &["threatview"],
    },
    SchemaSpec {
        name: "threatview_domain",
        parser: ParserKind::MixedList,
        default_url: "https://threatview.io/Downloads/Domain-High-Confidence-Feed.txt",
        default_tags: &["threatview"],
    },
    SchemaSpec {
        name: "threatview_url",
        parser: ParserKind::MixedList,
        default_url: "https://threatview.io/Downloads/URL-High-Confidence-Feed.txt",
        default_tags: &["threatview"],
    },
    SchemaSpec {
        name: "threatview_md5",
        parser: ParserKind::MixedList,
        default_url: "https://threatview.io/Downloads/MD5-HASH-ALL.txt",
        default_tags: &["threatview", "hash"],
    },
    SchemaSpec {
        name: "threatview_sha",
        parser: ParserKind::MixedList,
        default_url: "https://threatview.io/Downloads/SHA-HASH-FEED.txt",
        default_tags: &["threatview", "hash"],
    },
    SchemaSpec {
        name: "threatview_c2_hunt",
        parser: ParserKind::MixedList,
        default_url: "https://threatview.io/Downloads/C2-Hunt-Feed.txt",
        default_tags: &["threatview", "c2"],
    },
    // Single-list providers
    SchemaSpec {
        name: "emergingthreats_compromised",
        parser: ParserKind::IpList,
        default_url: "https://rules.emergingthreats.net/blockrules/compromised-ips.txt",
        default_tags: &["emergingthreats"],
    },
    SchemaSpec {
        name: "binarydefense_banlist",
        parser: ParserKind::IpList,
        default_url: "https://www.binarydefense.com/banlist.txt",
        default_tags: &["binarydefense"],
    },
    SchemaSpec {
        name: "cinsscore_badguys",
        parser: ParserKind::IpList,
        default_url: "https://cinsscore.com/list/ci-badguys.txt",
        default_tags: &["cinsscore"],
    },
    SchemaSpec {
        name: "greensnow",
        parser: ParserKind::IpList,
        default_url: "https://blocklist.greensnow.co/greensnow.txt",
        default_tags: &["greensnow"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_schema() {
        let spec = lookup("abuse_ch_urlhaus").unwrap();
        assert_eq!(spec.parser, ParserKind::UrlhausCsv);
        assert!(spec.default_url.starts_with("https://urlhaus.abuse.ch/"));
    }

    #[test]
    fn test_lookup_unknown_schema() {
        assert!(lookup("no_such_feed").is_none());
    }

    #[test]
    fn test_registry_names_unique() {
        let mut names: Vec<&str> = all_schemas().iter().map(|s| s.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
        assert!(before >= 40);
    }
}
