use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::database::DatabaseConnection;
use crate::translation::OverflowPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Look up full matches in the translation memory before submitting
    #[serde(default = "default_true")]
    pub use_tm: bool,

    /// Machine translation backend
    #[serde(default)]
    pub mt: MtConfig,

    /// Translation memory backend
    #[serde(default)]
    pub tm: TmConfig,

    /// Job storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// How sentences running over several lines are put back
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// Delay between polls while waiting for a job
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// eTranslation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MtConfig {
    /// Service root URL
    #[serde(default = "default_mt_endpoint")]
    pub endpoint: String,

    /// Basic-auth user name
    #[serde(default = "String::new")]
    pub username: String,

    /// Basic-auth password
    #[serde(default = "String::new")]
    pub password: String,

    /// Request timeout in seconds
    #[serde(default = "default_mt_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MtConfig {
    fn default() -> Self {
        Self {
            endpoint: default_mt_endpoint(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_mt_timeout_secs(),
        }
    }
}

/// Translation memory configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TmConfig {
    /// Service root URL
    #[serde(default = "default_tm_endpoint")]
    pub endpoint: String,

    /// Memory key, leave empty for the public memory
    #[serde(default = "String::new")]
    pub key: String,

    /// Maximum number of concurrent lookups
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Request timeout in seconds
    #[serde(default = "default_tm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tm_endpoint(),
            key: String::new(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_tm_timeout_secs(),
        }
    }
}

/// Job storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct StorageConfig {
    /// SQLite database file; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,
}

impl StorageConfig {
    /// Database file to open
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => DatabaseConnection::default_database_path(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrent_requests() -> usize {
    8
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_mt_timeout_secs() -> u64 {
    60
}

fn default_tm_timeout_secs() -> u64 {
    10
}

fn default_mt_endpoint() -> String {
    "https://webgate.ec.europa.eu/etranslation/si".to_string()
}

fn default_tm_endpoint() -> String {
    "https://mouse.occam.crosslang.com".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            warn!(
                "Source and target language are the same ({})",
                self.source_language
            );
        }

        if self.mt.endpoint.trim().is_empty() {
            return Err(anyhow!("Machine translation endpoint is required"));
        }

        if self.use_tm {
            if self.tm.endpoint.trim().is_empty() {
                return Err(anyhow!("Translation memory endpoint is required when use_tm is enabled"));
            }
            if self.tm.concurrent_requests == 0 {
                return Err(anyhow!("tm.concurrent_requests must be at least 1"));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Delay between polls as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load the configuration file, creating it with defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);

            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path));
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "nl".to_string(),
            use_tm: true,
            mt: MtConfig::default(),
            tm: TmConfig::default(),
            storage: StorageConfig::default(),
            overflow_policy: OverflowPolicy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            log_level: LogLevel::default(),
        }
    }
}
