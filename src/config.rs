// SPDX-License-Identifier: GPL-3.0-only
//! Runtime configuration
//!
//! Stored as TOML in `~/.config/monitor-vcp/config.toml`. Every field has a
//! default, so an empty or missing file yields the stock retry policy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VcpError};

pub const APP_DIR: &str = "monitor-vcp";
pub const CONFIG_FILE: &str = "config.toml";

/// Attempts per bus call and per checked write
pub const DEFAULT_ATTEMPTS: u32 = 10;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Transport calls per read or write before giving up
    pub retry_attempts: u32,
    /// Write/read-back rounds per checked write
    pub verify_attempts: u32,
    /// Pause between failed transport calls, in milliseconds
    pub retry_delay_ms: u64,
    /// EDID manufacturer ids that use the alternate power command
    pub alternate_power_manufacturers: Vec<String>,
    /// Read every level in the background when a monitor is attached
    pub refresh_on_attach: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_ATTEMPTS,
            verify_attempts: DEFAULT_ATTEMPTS,
            retry_delay_ms: 0,
            alternate_power_manufacturers: vec![crate::devices::dell::MANUFACTURER_ID.to_string()],
            refresh_on_attach: true,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("no config directory on this platform, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("errors loading config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| VcpError::Config(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| VcpError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn uses_alternate_power(&self, manufacturer_id: Option<&str>) -> bool {
        manufacturer_id.is_some_and(|id| {
            self.alternate_power_manufacturers
                .iter()
                .any(|m| m.eq_ignore_ascii_case(id.trim()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_policy() {
        let config = Config::default();
        assert_eq!(config.retry_attempts, 10);
        assert_eq!(config.verify_attempts, 10);
        assert_eq!(config.retry_delay_ms, 0);
        assert_eq!(config.alternate_power_manufacturers, vec!["DEL".to_string()]);
        assert!(config.refresh_on_attach);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse("retry_attempts = 3\nretry_delay_ms = 20\n").unwrap();
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 20);
        assert_eq!(config.verify_attempts, 10);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::parse("retry_attempts = \"many\"").unwrap_err();
        assert!(matches!(err, VcpError::Config(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            retry_attempts: 4,
            alternate_power_manufacturers: vec!["DEL".into(), "HWP".into()],
            ..Config::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, VcpError::Io(_)));
    }

    #[test]
    fn alternate_power_matches_case_insensitively() {
        let config = Config::default();
        assert!(config.uses_alternate_power(Some("DEL")));
        assert!(config.uses_alternate_power(Some("del")));
        assert!(!config.uses_alternate_power(Some("GSM")));
        assert!(!config.uses_alternate_power(None));
    }
}
