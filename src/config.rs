//! Aggregate configuration.
//!
//! Every section is optional and falls back to its defaults. With the
//! `config-file` feature a [`Config`] can be read from TOML:
//!
//! ```toml
//! [arena]
//! default_capacity = 512
//!
//! [gate]
//! capacity = 8
//!
//! [map]
//! initial_capacity = 64
//!
//! [log]
//! level = "warn"
//! format = "json"
//! ```

use crate::bytes::ArenaConfig;
use crate::observability::LogConfig;
use crate::sync::{GateConfig, MapConfig};
use serde::Deserialize;

#[cfg(feature = "config-file")]
use crate::error::{Error, Result};
#[cfg(feature = "config-file")]
use std::path::Path;

/// Configuration for every component in the crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Buffer arena sizing.
    pub arena: ArenaConfig,
    /// Admission gate capacity.
    pub gate: GateConfig,
    /// Concurrent map pre-sizing.
    pub map: MapConfig,
    /// Logging.
    pub log: LogConfig,
}

#[cfg(feature = "config-file")]
impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(all(test, feature = "config-file"))]
mod tests {
    use super::*;
    use crate::observability::{LogFormat, LogLevel};
    use std::io::Write;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [gate]
            capacity = 8

            [map]
            initial_capacity = 64

            [log]
            level = "warn"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.gate.capacity, 8);
        assert_eq!(config.map.initial_capacity, 64);
        assert_eq!(config.arena, ArenaConfig::default());
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[gate]\nlimit = 3\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(Config::from_toml_str("[pool]\n").is_err());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[arena]\ndefault_capacity = 1024").unwrap();
        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.arena.default_capacity, 1024);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
