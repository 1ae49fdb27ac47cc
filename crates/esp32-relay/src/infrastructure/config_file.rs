//! Optional TOML configuration file.
//!
//! Every key is optional; anything left out falls back to the CLI/env value
//! or the built-in default.  Unknown keys are rejected so a typo does not
//! silently leave a setting at its default.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//! handshake_timeout_secs = 10
//! close_timeout_secs = 10
//! idle_timeout_secs = 0      # 0 disables the idle timeout
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level file schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
}

/// The `[server]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// IP address to bind, e.g. `"0.0.0.0"` or `"127.0.0.1"`.
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub handshake_timeout_secs: Option<u64>,
    pub close_timeout_secs: Option<u64>,
    /// `0` disables the idle timeout.
    pub idle_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for invalid TOML, wrong value types or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`FileConfig::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
