//! RSS/Atom ingestion support
//!
//! Parses blog feeds into articles, filters them incrementally against the
//! per-source cursor, and extracts main article content from HTML pages.

pub mod content;
pub mod feed;
pub mod filter;

pub use content::{
    article_client, extract_main_content, fetch_article, ArticleFetcher, HttpArticleFetcher,
};
pub use feed::{feed_client, fetch_and_parse, parse_feed, Article};
pub use filter::{filter_new_articles, latest_article};
