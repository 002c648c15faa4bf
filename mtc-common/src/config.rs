//! Configuration loading and resolution
//!
//! Resolution priority: environment variables → TOML config file →
//! compiled defaults. There is no persisted settings store; this client
//! keeps nothing on disk besides the optional config file itself.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default interval between build status fetches (five minutes)
pub const DEFAULT_POLL_RATE_MS: u64 = 300_000;

/// Default broadcast buffer for build watch streams
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Default per-request timeout enforced by the HTTP transport
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the remote translation service
    pub base_url: String,

    /// Interval between build status fetches, in milliseconds
    #[serde(default = "default_poll_rate_ms")]
    pub poll_rate_ms: u64,

    /// Broadcast channel capacity for build watch streams
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Per-request timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_poll_rate_ms() -> u64 {
    DEFAULT_POLL_RATE_MS
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/machine-api/".to_string(),
            poll_rate_ms: DEFAULT_POLL_RATE_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl TomlConfig {
    /// Load configuration following the priority order:
    /// 1. Environment variables (highest)
    /// 2. TOML config file at the platform config directory
    /// 3. Compiled defaults
    pub fn resolve() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit TOML file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))
    }

    /// Apply `MTC_*` environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("MTC_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(rate) = std::env::var("MTC_POLL_RATE_MS") {
            match rate.parse() {
                Ok(ms) => self.poll_rate_ms = ms,
                Err(_) => tracing::warn!(value = %rate, "Ignoring non-numeric MTC_POLL_RATE_MS"),
            }
        }
        if let Ok(secs) = std::env::var("MTC_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(s) => self.request_timeout_secs = s,
                Err(_) => {
                    tracing::warn!(value = %secs, "Ignoring non-numeric MTC_REQUEST_TIMEOUT_SECS")
                }
            }
        }
    }
}

/// Default configuration file path for the platform
/// (`~/.config/mtc/config.toml` or the OS equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mtc").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_poll_rate() {
        let config = TomlConfig::default();
        assert_eq!(config.poll_rate_ms, 300_000);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: TomlConfig =
            toml::from_str("base_url = \"https://mt.example.org/api/\"").unwrap();
        assert_eq!(config.base_url, "https://mt.example.org/api/");
        assert_eq!(config.poll_rate_ms, DEFAULT_POLL_RATE_MS);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = TomlConfig::load(Path::new("/nonexistent/mtc.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://mt.example.org/\"\npoll_rate_ms = 50\n",
        )
        .unwrap();

        let config = TomlConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "https://mt.example.org/");
        assert_eq!(config.poll_rate_ms, 50);
    }
}
