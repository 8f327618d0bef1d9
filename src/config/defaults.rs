//! Default configuration values for memscan

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub regions: RegionDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub max_threads: usize,
    pub chunk_size: usize,
    pub parallel: bool,
}

/// Default region selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDefaults {
    pub writable_only: bool,
    pub include_executable: bool,
    pub max_region_size: u64,
    pub include_labels: Vec<String>,
    pub exclude_labels: Vec<String>,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub with_target: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            max_threads: num_cpus::get().min(8),
            chunk_size: 65536, // 64KB
            parallel: true,
        },
        regions: RegionDefaults {
            writable_only: false,
            include_executable: true,
            max_region_size: 0, // unlimited
            include_labels: Vec::new(),
            exclude_labels: Vec::new(),
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            with_target: false,
        },
    }
}
