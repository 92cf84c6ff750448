use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Export engine configuration stored at `~/.quill/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum number of renders running at once on the blocking pool.
    pub max_concurrent_exports: usize,

    // Request defaults applied when a caller leaves a parameter out.
    pub default_format: String,
    pub default_issue_type: Option<String>,
    pub default_page: i64,
    pub default_page_size: i64,

    /// Author written into document metadata.
    pub report_author: String,

    pub log_level: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_concurrent_exports: 4,
            default_format: "xls".into(),
            default_issue_type: Some("bug".into()),
            default_page: 1,
            default_page_size: 1000,
            report_author: "Quill".into(),
            log_level: "info".into(),
        }
    }
}

impl ExportConfig {
    /// Returns the base config directory: `~/.quill/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".quill"))
    }

    /// Returns the config file path: `~/.quill/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.quill/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Loads config from `~/.quill/config.json`, creating the default file if
    /// missing.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path, writing defaults there when the
    /// file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            config.validate()?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Load config from a file, or return defaults if it is missing, unreadable,
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<ExportConfig>(&data) {
                Ok(config) => match config.validate() {
                    Ok(()) => return config,
                    Err(e) => warn!("Invalid config file, using defaults: {e}"),
                },
                Err(e) => warn!("Corrupt config file, using defaults: {e}"),
            },
            Err(e) => warn!("Cannot read config file, using defaults: {e}"),
        }
        Self::default()
    }

    /// Save config as pretty JSON, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_exports == 0 {
            anyhow::bail!("max_concurrent_exports must be at least 1");
        }
        if self.default_page < 1 || self.default_page_size < 1 {
            anyhow::bail!(
                "default_page ({}) and default_page_size ({}) must be at least 1",
                self.default_page,
                self.default_page_size
            );
        }
        if self.default_format.trim().is_empty() {
            anyhow::bail!("default_format must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.max_concurrent_exports, 4);
        assert_eq!(config.default_format, "xls");
        assert_eq!(config.default_issue_type.as_deref(), Some("bug"));
        assert_eq!(config.default_page, 1);
        assert_eq!(config.default_page_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path_creates_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let config = ExportConfig::load_from_path(&path).unwrap();
        assert_eq!(config, ExportConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        let config = ExportConfig {
            max_concurrent_exports: 8,
            default_format: "pdf".into(),
            default_issue_type: None,
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = ExportConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.max_concurrent_exports, 8);
        assert_eq!(loaded.default_format, "pdf");
        assert_eq!(loaded.default_issue_type, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"default_page_size": 50}"#).unwrap();

        let loaded = ExportConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.default_page_size, 50);
        assert_eq!(loaded.max_concurrent_exports, 4);
    }

    #[test]
    fn test_load_from_path_rejects_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"max_concurrent_exports": 0}"#).unwrap();
        assert!(ExportConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn test_load_or_default_on_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ExportConfig::load_or_default(&path), ExportConfig::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ExportConfig::load_or_default(&tmp.path().join("absent.json"));
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_pagination_defaults() {
        let config = ExportConfig {
            default_page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
