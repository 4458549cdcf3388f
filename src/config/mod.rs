//! Configuration management for lectern
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the document API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable name that overrides the stored session token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Workspace used when none is given on the command line
    #[serde(default)]
    pub workspace: Option<String>,

    /// Refresh behaviour after mutations
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Document and storage limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Upload settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// List and search sizes
    #[serde(default)]
    pub display: DisplayConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Delay before the single re-fetch after reindex (milliseconds)
    #[serde(default = "default_refresh_delay_ms")]
    pub delay_ms: u64,

    /// Interval between re-fetches in `documents show --watch` (milliseconds)
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

/// Limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum documents per workspace (0 = unlimited)
    #[serde(default = "default_document_limit")]
    pub document_limit: u64,

    /// Maximum storage in bytes (unset = unlimited)
    #[serde(default)]
    pub storage_limit_bytes: Option<u64>,

    /// Percentage at which usage is reported as near the limit
    #[serde(default = "default_near_limit_percent")]
    pub near_limit_percent: f64,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Bucket recorded on created documents
    #[serde(default = "default_upload_bucket")]
    pub bucket: String,

    /// Region recorded on created documents
    #[serde(default = "default_upload_region")]
    pub region: String,

    /// Total time allowed for one storage PUT (seconds)
    #[serde(default = "default_upload_timeout_secs")]
    pub timeout_secs: u64,
}

impl UploadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Page size for list requests
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Number of results requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Recent queries shown on the dashboard
    #[serde(default = "default_recent_queries")]
    pub recent_queries: u32,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for lectern data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the stored session token
    pub session_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            workspace: None,
            refresh: RefreshConfig::default(),
            limits: LimitsConfig::default(),
            upload: UploadConfig::default(),
            display: DisplayConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_refresh_delay_ms(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            document_limit: default_document_limit(),
            storage_limit_bytes: None,
            near_limit_percent: default_near_limit_percent(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bucket: default_upload_bucket(),
            region: default_upload_region(),
            timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_limit: default_search_limit(),
            recent_queries: default_recent_queries(),
        }
    }
}

impl Config {
    /// Get the default base directory for lectern (~/.lectern)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lectern")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    fn paths_for(base: PathBuf, config_file: PathBuf) -> PathsConfig {
        PathsConfig {
            config_file,
            session_file: base.join("session.json"),
            base_dir: base,
        }
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = Self::paths_for(base.clone(), base.join("config.toml"));
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = Self::paths_for(base, config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Token from the override environment variable, if set and non-empty
    pub fn env_token(&self) -> Option<String> {
        if self.token_env.is_empty() {
            return None;
        }
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh.delay_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.watch_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("api_url is not a valid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(
                "api_url must use http or https".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }

        if self.upload.timeout_secs == 0 {
            return Err(Error::Config(
                "upload.timeout_secs must be positive".to_string(),
            ));
        }

        if self.refresh.watch_interval_ms == 0 {
            return Err(Error::Config(
                "refresh.watch_interval_ms must be positive".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.limits.near_limit_percent) {
            return Err(Error::Config(
                "limits.near_limit_percent must be between 0 and 100".to_string(),
            ));
        }

        if self.display.page_size == 0 || self.display.search_limit == 0 {
            return Err(Error::Config(
                "display.page_size and display.search_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.refresh.delay_ms, 1000);
        assert_eq!(config.limits.document_limit, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.workspace = Some("ws-1".to_string());
        config.limits.document_limit = 250;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.workspace.as_deref(), Some("ws-1"));
        assert_eq!(loaded.limits.document_limit, 250);
        assert_eq!(loaded.paths.session_file, tmp.path().join("session.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://api.example.com/api\"\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api_url, "https://api.example.com/api");
        assert_eq!(loaded.display.page_size, 100);
        assert_eq!(loaded.refresh.delay_ms, 1000);
        assert_eq!(loaded.upload.timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.api_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.api_url = "http://localhost:3001/api".to_string();
        assert!(config.validate().is_ok());

        config.limits.near_limit_percent = 120.0;
        assert!(config.validate().is_err());

        config.limits.near_limit_percent = 80.0;
        config.upload.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
