use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::DEFAULT_MAX_CONCURRENCY;
use crate::layout::DEFAULT_NEAR_OFFSET_PX;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Subjects evaluated at once by concurrent searches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Offset used by "near" when a constraint does not give one
    #[serde(default = "default_near_offset_px")]
    pub near_offset_px: f64,
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

impl MatchingSettings {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            near_offset_px: default_near_offset_px(),
            search_timeout_ms: default_search_timeout_ms(),
        }
    }
}

fn default_max_concurrency() -> usize { DEFAULT_MAX_CONCURRENCY }
fn default_near_offset_px() -> f64 { DEFAULT_NEAR_OFFSET_PX }
fn default_search_timeout_ms() -> u64 { 5_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// Replace level and/or format with explicit overrides, ignoring blanks
    pub fn with_overrides(mut self, level: Option<String>, format: Option<String>) -> Self {
        if let Some(level) = level.filter(|v| !v.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format.filter(|v| !v.trim().is_empty()) {
            self.format = format;
        }
        self
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PROXIMITY_)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PROXIMITY__MATCHING__MAX_CONCURRENCY -> matching.max_concurrency
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PROXIMITY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
