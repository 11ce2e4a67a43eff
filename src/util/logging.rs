//! Logging setup for stackmap
//!
//! Log records go to stderr so extracted records on stdout stay machine
//! readable. `RUST_LOG` overrides the configured level when set.
//!
//! ```no_run
//! use stackmap::util::logging;
//!
//! // With environment: STACKMAP_LOG_LEVEL=debug STACKMAP_LOG_JSON=true
//! logging::init_from_env();
//!
//! tracing::info!(source = "service-config", "extracting");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_LEVEL_ENV: &str = "STACKMAP_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "STACKMAP_LOG_JSON";

pub const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for the `stackmap` target
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g. stackmap::source)
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for log collectors.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Reads `STACKMAP_LOG_LEVEL` and `STACKMAP_LOG_JSON`.
    pub fn from_env() -> Self {
        let level = env::var(LOG_LEVEL_ENV)
            .ok()
            .map(|value| level_or_info(&value))
            .unwrap_or(Level::INFO);

        let use_json = env::var(LOG_JSON_ENV)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }
}

/// Parses a level name, case-insensitively.
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Like [`parse_level`], falling back to INFO with a note on stderr.
pub fn level_or_info(level_str: &str) -> Level {
    parse_level(level_str).unwrap_or_else(|| {
        eprintln!(
            "Invalid log level '{}', defaulting to INFO. Valid levels: {}",
            level_str,
            VALID_LEVELS.join(", ")
        );
        Level::INFO
    })
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(format!("stackmap={}", config.level))
        };

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use yare::parameterized;

    #[parameterized(
        trace = { "trace", Level::TRACE },
        debug = { "debug", Level::DEBUG },
        info = { "info", Level::INFO },
        warn = { "warn", Level::WARN },
        error = { "error", Level::ERROR },
        upper = { "DEBUG", Level::DEBUG },
        mixed = { "Warn", Level::WARN },
    )]
    fn test_parse_level(input: &str, expected: Level) {
        assert_eq!(parse_level(input), Some(expected));
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
        assert_eq!(level_or_info("verbose"), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
        assert!(!config.include_thread_ids);
    }

    #[test]
    fn test_production_and_development() {
        let production = LoggingConfig::production();
        assert!(production.use_json);
        assert!(production.include_location);

        let development = LoggingConfig::development();
        assert_eq!(development.level, Level::DEBUG);
        assert!(!development.use_json);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(LOG_LEVEL_ENV, "debug");
        env::set_var(LOG_JSON_ENV, "true");
        let config = LoggingConfig::from_env();
        env::remove_var(LOG_LEVEL_ENV);
        env::remove_var(LOG_JSON_ENV);

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var(LOG_LEVEL_ENV);
        env::set_var(LOG_JSON_ENV, "not-a-bool");
        let config = LoggingConfig::from_env();
        env::remove_var(LOG_JSON_ENV);

        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
    }
}
