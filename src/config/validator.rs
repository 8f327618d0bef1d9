//! Configuration validator for memscan
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, RegionConfig, ScannerConfig};

/// Smallest chunk that holds the widest scalar
const MIN_CHUNK_SIZE: usize = 8;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_regions(&config.regions)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.max_threads == 0 {
            return Err(ConfigError::Invalid(
                "Scanner threads must be at least 1".to_string(),
            ));
        }

        if scanner.max_threads > 128 {
            return Err(ConfigError::Invalid(
                "Scanner threads cannot exceed 128".to_string(),
            ));
        }

        if !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if scanner.chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Chunk size must be at least {} bytes",
                MIN_CHUNK_SIZE
            )));
        }

        Ok(())
    }

    fn validate_regions(regions: &RegionConfig) -> Result<(), ConfigError> {
        let labels = regions.include_labels.iter().chain(&regions.exclude_labels);
        for label in labels {
            if label.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "Region labels cannot be empty".to_string(),
                ));
            }
        }

        if let Some(label) = regions
            .include_labels
            .iter()
            .find(|label| regions.exclude_labels.contains(*label))
        {
            return Err(ConfigError::Invalid(format!(
                "Region label '{}' is both included and excluded",
                label
            )));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_thread_count() {
        let mut config = Config::default();
        config.scanner.max_threads = 0;
        let result = validate_config(&config);
        assert!(result.is_err());

        config.scanner.max_threads = 129;
        let result = validate_config(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut config = Config::default();
        config.scanner.chunk_size = 0;
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = 1000; // Not power of 2
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = 4;
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("at least 8"));
    }

    #[test]
    fn test_invalid_labels() {
        let mut config = Config::default();
        config.regions.exclude_labels = vec!["  ".to_string()];
        assert!(validate_config(&config).is_err());

        config.regions.exclude_labels = vec!["[heap]".to_string()];
        config.regions.include_labels = vec!["[heap]".to_string()];
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("[heap]"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("log level"));

        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_edge_cases() {
        let mut config = Config::default();

        config.scanner.max_threads = 1;
        config.scanner.chunk_size = 8;
        assert!(validate_config(&config).is_ok());

        config.scanner.max_threads = 128;
        config.scanner.chunk_size = 1 << 24;
        config.regions.max_region_size = u64::MAX;
        assert!(validate_config(&config).is_ok());
    }
}
