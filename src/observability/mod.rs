//! Logging setup.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the application installs a subscriber. [`init_logging`] is a convenience
//! for binaries and tests that want the usual `fmt` subscriber.
//!
//! `RUST_LOG`, when set and valid, takes precedence over
//! [`LogConfig::level`].

pub mod level;

pub use level::{LogLevel, ParseLevelError};

use crate::error::{Error, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Output format for [`init_logging`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Console,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

impl LogConfig {
    fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Installs a global `fmt` subscriber for `config`.
///
/// # Errors
///
/// Returns [`Error::Logging`] if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_thread_names(true);
    let installed = match config.format {
        LogFormat::Console => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| Error::Logging(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_console_at_info() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
    }

    #[test]
    fn second_install_is_reported() {
        // Whichever call wins, the other must fail rather than panic.
        let config = LogConfig {
            level: LogLevel::Off,
            format: LogFormat::Json,
        };
        let first = init_logging(&config);
        let second = init_logging(&config);
        assert!(second.is_err());
        if let Err(err) = first {
            assert!(matches!(err, Error::Logging(_)));
        }
    }
}
