//! Service configuration
//!
//! Loaded from a TOML file; every field has a default so a partial or
//! missing file still yields a working config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base directory for the word store and persisted state.
    /// Defaults to the platform data dir (resolved at service start).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Target language passed to the translation provider
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Cadence of the due-review scan, in seconds
    #[serde(default = "default_review_tick_secs")]
    pub review_tick_secs: u64,

    /// Maximum number of undrained events kept for UI surfaces
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

fn default_target_language() -> String {
    "zh-CN".to_string()
}

fn default_review_tick_secs() -> u64 {
    60
}

fn default_event_queue_capacity() -> usize {
    256
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            target_language: default_target_language(),
            review_tick_secs: default_review_tick_secs(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

impl ServiceConfig {
    /// Load config from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid config at {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.target_language, "zh-CN");
        assert_eq!(config.review_tick_secs, 60);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig = toml::from_str("target_language = \"ja\"").unwrap();
        assert_eq!(config.target_language, "ja");
        assert_eq!(config.review_tick_secs, 60);
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let config = ServiceConfig::load(Path::new("/nonexistent/wordbook.toml"));
        assert_eq!(config.review_tick_secs, 60);
    }
}
