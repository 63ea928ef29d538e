//! Client configuration.
//!
//! Holds the active organization id and a few client settings. Stored at
//! `~/.config/orgcache/config.json` (platform config dir). Section data is
//! never persisted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::Section;
use crate::session::SessionOptions;

/// Application name used for the config directory
const APP_NAME: &str = "orgcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub organization_id: Option<String>,
    pub api_base_url: Option<String>,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Missing file yields the default config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn session_options(&self, initial_section: Section) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            max_concurrent_requests: self
                .max_concurrent_requests
                .unwrap_or(defaults.max_concurrent_requests),
            initial_section,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfid::DEFAULT_MAX_CONCURRENT_REQUESTS;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.json")).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            organization_id: Some("org1".to_string()),
            api_base_url: Some("https://api.example.com".to_string()),
            max_concurrent_requests: Some(8),
            request_timeout_secs: None,
        };

        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"organization_id":"org9"}"#).expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.organization_id.as_deref(), Some("org9"));
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_session_options() {
        let options = Config::default().session_options(Section::Assets);
        assert_eq!(options.max_concurrent_requests, DEFAULT_MAX_CONCURRENT_REQUESTS);
        assert_eq!(options.initial_section, Section::Assets);

        let tuned = Config {
            max_concurrent_requests: Some(2),
            ..Config::default()
        };
        assert_eq!(tuned.session_options(Section::Members).max_concurrent_requests, 2);
    }
}
