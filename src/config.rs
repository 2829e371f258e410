/*!
 * Configuration support for the visitas library
 *
 * Runtime knobs that do not belong in the pipeline API: progress bar,
 * parallel execution, and the top-codes limit. Loaded from a TOML file in
 * the platform config directory, then overridden by environment variables.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Global configuration for the visitas library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitasConfig {
    /// Whether to show a progress bar while loading the visit dataset
    #[serde(default = "default_enable_progress_bar")]
    pub enable_progress_bar: bool,

    /// Whether to run the two report branches on separate threads
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// How many recurring codes the top-codes report keeps
    #[serde(default = "default_top_codes")]
    pub top_codes: usize,
}

impl Default for VisitasConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: default_enable_progress_bar(),
            parallel: default_parallel(),
            top_codes: default_top_codes(),
        }
    }
}

// Default value functions for serde
fn default_enable_progress_bar() -> bool {
    true
}

fn default_parallel() -> bool {
    true
}

fn default_top_codes() -> usize {
    crate::constants::DEFAULT_TOP_CODES
}

impl VisitasConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `VISITAS_PROGRESS_BAR`: "true" or "false"
    /// - `VISITAS_PARALLEL`: "true" or "false"
    /// - `VISITAS_TOP_CODES`: number
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VISITAS_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("VISITAS_PARALLEL") {
            config.parallel = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("VISITAS_TOP_CODES") {
            if let Ok(n) = val.parse() {
                config.top_codes = n;
            }
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::VisitasError::Configuration {
                message: format!("failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::VisitasError::Configuration {
                message: format!("failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/visitas/config.toml` on Unix-like systems
    /// or `%APPDATA%\visitas\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "visitas")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                if let Ok(config) = Self::from_file(&config_path) {
                    return config;
                }
            }
        }

        Self::from_env()
    }
}

// Global configuration support
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<VisitasConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: VisitasConfig) {
    *GLOBAL_CONFIG.write().unwrap() = Some(config);
}

/// Get the global configuration (or default if not set)
pub fn global_config() -> VisitasConfig {
    GLOBAL_CONFIG.read().unwrap()
        .as_ref()
        .cloned()
        .unwrap_or_else(VisitasConfig::load)
}

/// Clear the global configuration
pub fn clear_global_config() {
    *GLOBAL_CONFIG.write().unwrap() = None;
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: VisitasConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self { config: VisitasConfig::default() }
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set parallel execution
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// Set the top-codes limit
    pub fn top_codes(mut self, limit: usize) -> Self {
        self.config.top_codes = limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> VisitasConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = VisitasConfig::default();
        assert!(config.enable_progress_bar);
        assert!(config.parallel);
        assert_eq!(config.top_codes, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .progress_bar(false)
            .parallel(false)
            .top_codes(5)
            .build();

        assert!(!config.enable_progress_bar);
        assert!(!config.parallel);
        assert_eq!(config.top_codes, 5);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigBuilder::new().top_codes(7).build();
        config.save(&path).unwrap();
        let loaded = VisitasConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
