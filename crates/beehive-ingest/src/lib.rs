//! Fetch orchestration for the beehive core
//!
//! Wires the pipelines together: the orchestrator iterates the configured
//! source map and dispatches each source to the RSS or feed runner, which
//! fetch, parse, extract, embed and upsert, recording one History per run
//! under the source.

pub mod config;
pub mod feed_runner;
pub mod logging;
pub mod orchestrator;
pub mod rss_runner;
mod runner;
pub mod source;

pub use config::{Config, FeedSourceConfig, RssSourceConfig};
pub use feed_runner::FeedRunner;
pub use logging::init_logging;
pub use orchestrator::Orchestrator;
pub use rss_runner::RssRunner;
pub use source::{FeedSource, RssSource, Source};
