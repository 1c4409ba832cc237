//! Logging bootstrap for embedding binaries

use std::str::FromStr;

use tracing::Level;

/// Install a global fmt subscriber at the given level (`"info"`, `"debug"`,
/// ...). Safe to call more than once; later calls are no-ops.
pub fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
