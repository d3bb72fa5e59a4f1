// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration persistence (save/load).

use crate::config::AppConfig;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Manages the config file under the user's config directory.
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Config manager for `$XDG_CONFIG_HOME/appvol`.
    pub fn new() -> Result<Self, ConfigError> {
        let project_dirs = ProjectDirs::from("", "", "appvol").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_dir(project_dirs.config_dir()))
    }

    /// Config manager rooted at an explicit directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the main config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load the application config. A missing file yields defaults.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let path = self.config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = fs::read_to_string(&path)?;
            Ok(AppConfig::from_toml(&content)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Save the application config, creating the directory if needed.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;
        let content = config.to_toml()?;
        fs::write(self.config_path(), content)?;
        Ok(())
    }
}

/// Load the user's config, falling back to defaults on any error.
pub fn load_or_default() -> AppConfig {
    let loaded = ConfigManager::new().and_then(|manager| manager.load_config());
    match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path());
        assert_eq!(manager.load_config().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join("nested"));

        let mut config = AppConfig::default();
        config.window.width = 720;
        manager.save_config(&config).unwrap();

        assert!(manager.config_path().exists());
        assert_eq!(manager.load_config().unwrap().window.width, 720);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path());
        fs::write(manager.config_path(), "[window\nwidth = 1").unwrap();

        assert!(matches!(
            manager.load_config(),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
