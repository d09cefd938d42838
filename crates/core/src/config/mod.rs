//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::{NotifyConfig, WorkerConfig};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Keep stores in memory only; `db_path` is ignored.
    ///
    /// Set via SWCACHE_EPHEMERAL environment variable.
    #[serde(default)]
    pub ephemeral: bool,

    /// The service's own origin. Requests to any other origin are not intercepted.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version identifier naming the current cache generation.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Assets that must be stored before a generation can activate.
    ///
    /// Set via SWCACHE_MANIFEST environment variable (comma-separated).
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Application name shown on the offline page and in notifications.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Heading of the offline page.
    #[serde(default = "default_offline_heading")]
    pub offline_heading: String,

    /// Icon used for notifications and their actions.
    #[serde(default = "default_icon")]
    pub icon: String,

    /// Document opened when the "explore" notification action is clicked.
    #[serde(default = "default_open_target")]
    pub open_target: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    "timecraft-v1.0.0".into()
}

fn default_manifest() -> Vec<String> {
    vec!["./metronome_prototype.html".into(), "./manifest.json".into()]
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_app_name() -> String {
    "TimeCraft".into()
}

fn default_offline_heading() -> String {
    "🎵 TimeCraft Metronome".into()
}

fn default_icon() -> String {
    "./icon-192.png".into()
}

fn default_open_target() -> String {
    "./metronome_prototype.html".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ephemeral: false,
            origin: default_origin(),
            cache_version: default_cache_version(),
            manifest: default_manifest(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            app_name: default_app_name(),
            offline_heading: default_offline_heading(),
            icon: default_icon(),
            open_target: default_open_target(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["config_file", "manifest"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        if let Ok(list) = std::env::var("SWCACHE_MANIFEST") {
            config.manifest = split_list(&list);
        }

        config.validate()?;

        Ok(config)
    }

    /// Parsed service origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL with a host.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL with a host".into() });
        }
        Ok(url)
    }

    /// Immutable per-generation configuration handed to the lifecycle controller.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        Ok(WorkerConfig {
            version: self.cache_version.clone(),
            origin: self.origin_url()?,
            manifest: self.manifest.clone(),
            app_name: self.app_name.clone(),
            offline_heading: self.offline_heading.clone(),
        })
    }

    /// Notification passthrough settings.
    pub fn notify_config(&self) -> NotifyConfig {
        NotifyConfig { app_name: self.app_name.clone(), icon: self.icon.clone(), open_target: self.open_target.clone() }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
