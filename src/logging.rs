//! Console logging.
//!
//! Timestamped, leveled lines on stderr via `tracing-subscriber`. The filter
//! is fixed by [`LogConfig`]; no environment variable is consulted.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Logging configuration, fixed for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Most verbose level emitted for this crate
    pub level: Level,
    /// Colorize output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Filter directive: this crate at `level`, dependencies at warn.
    pub fn directive(&self) -> String {
        format!("warn,{}={}", env!("CARGO_CRATE_NAME"), self.level)
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.directive()))
        .with_target(false)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}
