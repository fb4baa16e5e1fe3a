//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding `backend.url`.
pub const ENV_BACKEND_URL: &str = "EXAMSHELF_BACKEND_URL";

/// Environment variable overriding `backend.anon_key`.
pub const ENV_ANON_KEY: &str = "EXAMSHELF_ANON_KEY";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hosted backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Home-view search behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Where downloaded files are written
    #[serde(default)]
    pub downloads: DownloadConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Replace backend credentials with values from the environment, if set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BACKEND_URL).ok(),
            std::env::var(ENV_ANON_KEY).ok(),
        );
    }

    fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|v| !v.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = anon_key.filter(|v| !v.trim().is_empty()) {
            self.backend.anon_key = key;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(AppError::validation("backend.url is empty"));
        }
        url::Url::parse(&self.backend.url)
            .map_err(|e| AppError::validation(format!("backend.url is invalid: {e}")))?;
        if self.backend.anon_key.trim().is_empty() {
            return Err(AppError::validation("backend.anon_key is empty"));
        }
        if self.backend.resource_table.trim().is_empty() {
            return Err(AppError::validation("backend.resource_table is empty"));
        }
        if self.backend.storage_bucket.trim().is_empty() {
            return Err(AppError::validation("backend.storage_bucket is empty"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(AppError::validation("backend.timeout_secs must be > 0"));
        }
        if self.search.recent_limit == 0 || self.search.search_limit == 0 {
            return Err(AppError::validation("search limits must be > 0"));
        }
        if self.search.recent_limit > self.search.search_limit {
            return Err(AppError::validation(
                "search.recent_limit must not exceed search.search_limit",
            ));
        }
        Ok(())
    }
}

/// Hosted backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Public (anonymous) API key sent with every request
    #[serde(default)]
    pub anon_key: String,

    /// Relation holding downloadable resources
    #[serde(default = "defaults::resource_table")]
    pub resource_table: String,

    /// Storage bucket that relative `file_path` values live in
    #[serde(default = "defaults::storage_bucket")]
    pub storage_bucket: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            resource_table: defaults::resource_table(),
            storage_bucket: defaults::storage_bucket(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Search overlay settings for the home view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Keystroke inactivity before a search is issued
    #[serde(default = "defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// Row limit for the recent/featured listing
    #[serde(default = "defaults::recent_limit")]
    pub recent_limit: usize,

    /// Row limit while a search term is active
    #[serde(default = "defaults::search_limit")]
    pub search_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::debounce_ms(),
            recent_limit: defaults::recent_limit(),
            search_limit: defaults::search_limit(),
        }
    }
}

/// Download destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn resource_table() -> String {
        "Exam-prep".into()
    }
    pub fn storage_bucket() -> String {
        "question-papers".into()
    }
    pub fn user_agent() -> String {
        concat!("examshelf/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn debounce_ms() -> u64 {
        300
    }
    pub fn recent_limit() -> usize {
        6
    }
    pub fn search_limit() -> usize {
        50
    }

    pub fn output_dir() -> PathBuf {
        PathBuf::from("downloads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.backend.url = "https://demo.supabase.co".to_string();
        config.backend.anon_key = "anon".to_string();
        config
    }

    #[test]
    fn validate_valid_config_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_url() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = valid_config();
        config.backend.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_limits() {
        let mut config = valid_config();
        config.search.recent_limit = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.resource_table, "Exam-prep");
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.recent_limit, 6);
        assert_eq!(config.search.search_limit, 50);
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let mut config = valid_config();
        config.apply_overrides(Some("https://other.supabase.co".into()), Some("  ".into()));
        assert_eq!(config.backend.url, "https://other.supabase.co");
        assert_eq!(config.backend.anon_key, "anon");
    }
}
