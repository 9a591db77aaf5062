//! Lookup configuration
//!
//! Settings for the external catalog source, loadable from
//! `~/.config/kasin/config.toml` and overridable per flag from the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{KasinError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Seconds to wait between consecutive catalog requests
    pub delay_seconds: u64,
    /// Catalog base URL
    pub base_url: String,
    /// User agent sent with catalog requests
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 3,
            base_url: "https://www.amazon.com".to_string(),
            // The catalog serves its robot check far more eagerly to
            // non-browser user agents
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl LookupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    /// Default config file location (`~/.config/kasin/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kasin").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| KasinError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| KasinError::Config(format!("{}: {e}", path.display())))
    }

    /// Load from the default location, falling back to defaults when the
    /// file is absent or unusable.
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_else(|err| {
                warn!(%err, "ignoring unusable config file");
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.delay(), Duration::from_secs(3));
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: LookupConfig = toml::from_str("delay_seconds = 10").unwrap();
        assert_eq!(config.delay_seconds, 10);
        assert_eq!(config.base_url, LookupConfig::default().base_url);
    }
}
