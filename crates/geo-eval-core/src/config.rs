//! Client configuration
//!
//! Read from `<config dir>/geo-eval/config.toml` when present, then
//! overridden by `GEO_EVAL_API_URL`. Missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeoError, Result};

/// Environment variable overriding the service base URL
pub const API_URL_ENV: &str = "GEO_EVAL_API_URL";

/// Upper bound on user-edited keywords, matching the service's limit
pub const DEFAULT_MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analysis service
    pub api_url: String,
    /// Phase 1 endpoint (keyword extraction)
    pub keywords_path: String,
    /// Phase 2 endpoint (citation ranking)
    pub rankings_path: String,
    pub connect_timeout_secs: u64,
    pub max_keywords: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            keywords_path: "/stream/analyze/get_keywords".to_string(),
            rankings_path: "/stream/analyze/get_rankings".to_string(),
            connect_timeout_secs: 10,
            max_keywords: DEFAULT_MAX_KEYWORDS,
        }
    }
}

impl ClientConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            GeoError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            GeoError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GeoError::Config(format!("failed to parse: {}", e)))
    }

    /// `<config dir>/geo-eval/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geo-eval").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
    }

    pub fn keywords_url(&self) -> String {
        self.endpoint(&self.keywords_path)
    }

    pub fn rankings_url(&self) -> String {
        self.endpoint(&self.rankings_path)
    }

    pub fn health_url(&self) -> String {
        self.endpoint("/")
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_keywords, 10);
        assert_eq!(
            config.keywords_url(),
            "http://localhost:8000/stream/analyze/get_keywords"
        );
        assert_eq!(config.health_url(), "http://localhost:8000/");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str("api_url = \"https://geo.example.com/\"\n").unwrap();
        assert_eq!(
            config.rankings_url(),
            "https://geo.example.com/stream/analyze/get_rankings"
        );
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ClientConfig::from_toml_str("max_keywords = \"ten\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_invalid_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_keywords = [").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_keywords = 5").unwrap();
        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.max_keywords, 5);
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
