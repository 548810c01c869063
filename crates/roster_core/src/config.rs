use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// ---------------------------------------------------------------------------
// RosterConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.roster/config.json`.
///
/// Enumerated settings (`default_format`, `header_style`, `csv_quote_style`)
/// are kept as plain strings so an old or hand-edited file never fails to
/// load; the export crate parses them and falls back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    // Export destination. `None` means the OS download directory.
    pub export_dir: Option<PathBuf>,

    // Document decoration
    pub branding: String,
    pub default_format: String,
    pub header_style: String,

    // Delimited text
    pub csv_quote_style: String,
    pub csv_byte_order_mark: bool,

    // Paginated document (points)
    pub pdf_first_column_width: f64,
    pub pdf_font_size: f64,
    pub pdf_margin: f64,

    // General
    pub log_level: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            export_dir: None,
            branding: "Voter Roster".into(),
            default_format: "csv".into(),
            header_style: "humanized".into(),
            csv_quote_style: "never".into(),
            csv_byte_order_mark: false,
            pdf_first_column_width: 90.0,
            pdf_font_size: 8.0,
            pdf_margin: 36.0,
            log_level: "info".into(),
        }
    }
}

impl RosterConfig {
    /// Returns the base config directory: `~/.roster/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".roster"))
    }

    /// Returns the config file path: `~/.roster/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.roster/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates the default file if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to `~/.roster/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Directory generated files are saved into: the configured
    /// `export_dir`, else the OS download directory, else the home directory.
    pub fn resolved_export_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.export_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .or_else(dirs::home_dir)
            .context("Could not determine a download directory")
    }
}

// ---------------------------------------------------------------------------
// ConfigManager
// ---------------------------------------------------------------------------

/// Thread-safe config holder that persists every update to its backing file.
pub struct ConfigManager {
    config: Arc<RwLock<RosterConfig>>,
    path: PathBuf,
}

impl ConfigManager {
    /// Open the config at the default location.
    pub fn new() -> Result<Self> {
        RosterConfig::ensure_dirs()?;
        Self::open(RosterConfig::config_path()?)
    }

    /// Open (or create) the config stored at `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let config = RosterConfig::load_from_path(&path)?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// Get a clone of the current config.
    pub fn get(&self) -> RosterConfig {
        self.config.read().clone()
    }

    /// Update the config and write it back to disk.
    pub fn update(&self, f: impl FnOnce(&mut RosterConfig)) -> Result<()> {
        let mut config = self.config.write();
        f(&mut config);
        config.save_to_path(&self.path)?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let path = tmp.path().join("config.json");
        (tmp, path)
    }

    #[test]
    fn default_config_values() {
        let config = RosterConfig::default();
        assert_eq!(config.branding, "Voter Roster");
        assert_eq!(config.default_format, "csv");
        assert_eq!(config.header_style, "humanized");
        assert_eq!(config.csv_quote_style, "never");
        assert!(!config.csv_byte_order_mark);
        assert_eq!(config.pdf_margin, 36.0);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn load_missing_file_creates_default() {
        let (_tmp, path) = temp_config_path();
        assert!(!path.exists());

        let config = RosterConfig::load_from_path(&path).unwrap();
        assert_eq!(config, RosterConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let (_tmp, path) = temp_config_path();
        let config = RosterConfig {
            branding: "County GOTV".into(),
            default_format: "pdf".into(),
            pdf_first_column_width: 120.0,
            ..RosterConfig::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = RosterConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.branding, "County GOTV");
        assert_eq!(loaded.default_format, "pdf");
        assert_eq!(loaded.pdf_first_column_width, 120.0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let (_tmp, path) = temp_config_path();
        std::fs::write(&path, r#"{ "branding": "Precinct 12" }"#).unwrap();

        let config = RosterConfig::load_from_path(&path).unwrap();
        assert_eq!(config.branding, "Precinct 12");
        assert_eq!(config.csv_quote_style, "never");
        assert_eq!(config.pdf_font_size, 8.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_tmp, path) = temp_config_path();
        std::fs::write(&path, "{ not json").unwrap();

        let err = RosterConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn explicit_export_dir_wins() {
        let config = RosterConfig {
            export_dir: Some(PathBuf::from("/srv/exports")),
            ..RosterConfig::default()
        };
        assert_eq!(
            config.resolved_export_dir().unwrap(),
            PathBuf::from("/srv/exports")
        );
    }

    #[test]
    fn manager_update_persists() {
        let (_tmp, path) = temp_config_path();
        let manager = ConfigManager::open(path.clone()).unwrap();
        manager
            .update(|c| c.csv_byte_order_mark = true)
            .unwrap();

        assert!(manager.get().csv_byte_order_mark);
        let reloaded = RosterConfig::load_from_path(&path).unwrap();
        assert!(reloaded.csv_byte_order_mark);
        assert_eq!(manager.path(), path.as_path());
    }
}
