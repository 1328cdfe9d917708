//! Configuration management for Tabula.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.
//! It holds the defaults applied to every table; per-table choices live in
//! [`UserConfig`](crate::user_config::UserConfig) snapshots instead.

use crate::error::{Result, TabulaError};
use crate::selection::UpdateSelection;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Tabula.
///
/// ## Example Configuration File (tabula.toml)
///
/// ```toml
/// [general]
/// default_limit = 25
/// log_level = "info"
///
/// [table]
/// update_selection_on_refresh = "onChange"
/// auto_save = true
///
/// [performance]
/// parallel_filter = true
/// parallel_threshold = 10000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Table behaviour defaults
    pub table: TableConfig,

    /// Performance tuning
    pub performance: PerformanceConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Page size for tables without a stored configuration
    pub default_limit: usize,

    /// Table storage location (None = default location)
    pub storage_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            default_limit: 10,
            storage_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Selection reconciliation policy after a reload
    pub update_selection_on_refresh: UpdateSelection,

    /// Persist and restore per-table user configuration
    pub auto_save: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            update_selection_on_refresh: UpdateSelection::OnChange,
            auto_save: true,
        }
    }
}

/// Performance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Use parallel filtering for large datasets
    pub parallel_filter: bool,

    /// Row count above which filtering goes parallel
    pub parallel_threshold: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            parallel_filter: true,
            parallel_threshold: 10000,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| TabulaError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| TabulaError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "tabula").ok_or_else(|| TabulaError::ConfigError {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("tabula.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "tabula").ok_or_else(|| TabulaError::ConfigError {
            reason: "Could not determine data directory".to_string(),
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the table storage directory (from config or default).
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.general.storage_dir {
            Ok(path.clone())
        } else {
            Self::default_data_dir()
        }
    }

    /// Rows above which the filter pass runs in parallel, if enabled
    pub fn parallel_threshold(&self) -> Option<usize> {
        self.performance
            .parallel_filter
            .then_some(self.performance.parallel_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.default_limit, 10);
        assert_eq!(
            config.table.update_selection_on_refresh,
            UpdateSelection::OnChange
        );
        assert!(config.table.auto_save);
        assert_eq!(config.parallel_threshold(), Some(10000));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.general.default_limit = 25;
        config.table.update_selection_on_refresh = UpdateSelection::Never;
        config.general.storage_dir = Some(temp_dir.path().join("data"));

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.general.default_limit, 25);
        assert_eq!(
            loaded.table.update_selection_on_refresh,
            UpdateSelection::Never
        );
        assert_eq!(loaded.storage_dir().unwrap(), temp_dir.path().join("data"));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.general.default_limit, 10);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(
            &config_path,
            "[table]\nupdate_selection_on_refresh = \"always\"\n\n[performance]\nparallel_filter = false\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.table.update_selection_on_refresh,
            UpdateSelection::Always
        );
        assert!(config.table.auto_save);
        assert_eq!(config.parallel_threshold(), None);
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[general\n").unwrap();

        assert!(matches!(
            Config::load_from(&config_path),
            Err(TabulaError::ConfigError { .. })
        ));
    }
}
