//! Logging setup
//!
//! All crate output goes through `tracing`; the binary installs a compact
//! formatter filtered to this crate.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Debug when verbose, info otherwise
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

/// Filter directive limiting output to this crate
pub fn filter_directive(level: LogLevel) -> String {
    format!("apiforge={}", level.to_tracing_level())
}

/// Initialize the global subscriber
///
/// A second call is ignored.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(filter_directive(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(LogLevel::from_verbose(true)), "apiforge=DEBUG");
        assert_eq!(filter_directive(LogLevel::from_verbose(false)), "apiforge=INFO");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logger(LogLevel::Warn);
        init_logger(LogLevel::Debug);
    }
}
