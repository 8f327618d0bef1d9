//! Configuration loader for memscan
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File read by `load_config`, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "memscan.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_regions")]
    pub regions: RegionConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

/// Which regions an initial scan visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default = "default_writable_only")]
    pub writable_only: bool,
    #[serde(default = "default_include_executable")]
    pub include_executable: bool,
    /// Largest region scanned, in bytes; 0 scans regions of any size
    #[serde(default = "default_max_region_size")]
    pub max_region_size: u64,
    /// Label substrings a region must match one of; empty keeps all
    #[serde(default = "default_include_labels")]
    pub include_labels: Vec<String>,
    #[serde(default = "default_exclude_labels")]
    pub exclude_labels: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is missing
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads `memscan.toml` from the working directory, or the defaults
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        max_threads: defaults.scanner.max_threads,
        chunk_size: defaults.scanner.chunk_size,
        parallel: defaults.scanner.parallel,
    }
}

fn default_regions() -> RegionConfig {
    let defaults = default_config();
    RegionConfig {
        writable_only: defaults.regions.writable_only,
        include_executable: defaults.regions.include_executable,
        max_region_size: defaults.regions.max_region_size,
        include_labels: defaults.regions.include_labels,
        exclude_labels: defaults.regions.exclude_labels,
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        with_target: defaults.logging.with_target,
    }
}

// Individual field defaults
fn default_max_threads() -> usize {
    default_config().scanner.max_threads
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_parallel() -> bool {
    default_config().scanner.parallel
}

fn default_writable_only() -> bool {
    default_config().regions.writable_only
}

fn default_include_executable() -> bool {
    default_config().regions.include_executable
}

fn default_max_region_size() -> u64 {
    default_config().regions.max_region_size
}

fn default_include_labels() -> Vec<String> {
    default_config().regions.include_labels
}

fn default_exclude_labels() -> Vec<String> {
    default_config().regions.exclude_labels
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_with_target() -> bool {
    default_config().logging.with_target
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            regions: default_regions(),
            logging: default_logging(),
        }
    }
}
