//! Gallery settings management
//!
//! This module provides settings persistence, loading, and updating for the
//! gallery: packaging defaults, validation limits, dependency loading and
//! storage location.

use crate::Result;
use animpack::validator::{default_required_files, DEFAULT_MAX_PACKAGE_SIZE};
use animpack::{CompressionScheme, PackageOptions, ValidatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main gallery settings container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GallerySettings {
    #[serde(default)]
    pub packaging: PackagingSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub dependencies: DependencySettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Archive compression settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackagingSettings {
    pub compression: CompressionScheme,
    pub level: i64,
}

impl Default for PackagingSettings {
    fn default() -> Self {
        Self {
            compression: CompressionScheme::Deflated,
            level: animpack::packager::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Import validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationSettings {
    /// Maximum total uncompressed package size in bytes
    pub max_package_size: u64,
    /// Files whose absence produces a warning
    pub required_files: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_package_size: DEFAULT_MAX_PACKAGE_SIZE,
            required_files: default_required_files(),
        }
    }
}

/// Dependency loading settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DependencySettings {
    /// Per-resource load timeout in milliseconds
    pub timeout_ms: u64,
    /// Fail imports when any dependency fails to load
    pub strict: bool,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            strict: false,
        }
    }
}

/// Storage location settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Template store directory; relative paths resolve against the data dir
    pub templates_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
        }
    }
}

impl GallerySettings {
    /// Packaging options derived from these settings
    pub fn package_options(&self) -> PackageOptions {
        PackageOptions::default()
            .with_compression(self.packaging.compression)
            .with_level(self.packaging.level)
    }

    /// Validator configuration derived from these settings
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig::default()
            .with_max_package_size(self.validation.max_package_size)
            .with_required_files(self.validation.required_files.clone())
    }

    /// Dependency load timeout
    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependencies.timeout_ms)
    }

    /// Resolve the template store directory against a data directory
    pub fn templates_dir(&self, data_dir: &Path) -> PathBuf {
        if self.storage.templates_dir.is_absolute() {
            self.storage.templates_dir.clone()
        } else {
            data_dir.join(&self.storage.templates_dir)
        }
    }
}

/// Settings manager for loading, saving, and updating gallery settings
pub struct SettingsManager {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Current settings (cached)
    current: GallerySettings,
}

impl SettingsManager {
    /// Create a new settings manager with the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        let settings_path = data_dir.join("settings.json");
        Self {
            settings_path,
            current: GallerySettings::default(),
        }
    }

    /// Get the path to the settings file
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    fn parse_or_default(content: &str) -> GallerySettings {
        match serde_json::from_str::<GallerySettings>(content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse settings file, using defaults: {}", e);
                GallerySettings::default()
            }
        }
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub async fn load(&mut self) -> Result<&GallerySettings> {
        self.current = if tokio::fs::try_exists(&self.settings_path).await? {
            let content = tokio::fs::read_to_string(&self.settings_path).await?;
            Self::parse_or_default(&content)
        } else {
            GallerySettings::default()
        };
        Ok(&self.current)
    }

    /// Load settings synchronously
    pub fn load_sync(&mut self) -> Result<&GallerySettings> {
        self.current = if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            Self::parse_or_default(&content)
        } else {
            GallerySettings::default()
        };
        Ok(&self.current)
    }

    /// Save current settings to disk
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    /// Save settings synchronously
    pub fn save_sync(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &GallerySettings {
        &self.current
    }

    /// Update settings and save to disk
    pub async fn update(&mut self, settings: GallerySettings) -> Result<()> {
        self.current = settings;
        self.save().await
    }

    /// Update settings synchronously
    pub fn update_sync(&mut self, settings: GallerySettings) -> Result<()> {
        self.current = settings;
        self.save_sync()
    }

    /// Reset settings to defaults and save
    pub async fn reset(&mut self) -> Result<&GallerySettings> {
        self.current = GallerySettings::default();
        self.save().await?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = GallerySettings::default();

        assert_eq!(settings.packaging.compression, CompressionScheme::Deflated);
        assert_eq!(settings.packaging.level, 6);
        assert_eq!(settings.validation.max_package_size, 50 * 1024 * 1024);
        assert_eq!(settings.validation.required_files.len(), 5);
        assert_eq!(settings.dependencies.timeout_ms, 15_000);
        assert!(!settings.dependencies.strict);
        assert_eq!(settings.dependency_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: GallerySettings =
            serde_json::from_str(r#"{"dependencies": {"strict": true}, "packaging": {"compression": "stored"}}"#)
                .unwrap();

        assert!(settings.dependencies.strict);
        assert_eq!(settings.dependencies.timeout_ms, 15_000);
        assert_eq!(settings.packaging.compression, CompressionScheme::Stored);
        assert_eq!(settings.packaging.level, 6);
        assert_eq!(settings.validation, ValidationSettings::default());
    }

    #[test]
    fn test_templates_dir_resolution() {
        let settings = GallerySettings::default();
        assert_eq!(
            settings.templates_dir(Path::new("/data")),
            PathBuf::from("/data/templates")
        );
    }

    #[test]
    fn test_derived_configs() {
        let mut settings = GallerySettings::default();
        settings.validation.max_package_size = 1024;
        settings.packaging.level = 9;

        assert_eq!(settings.validator_config().max_package_size, 1024);
        assert_eq!(settings.package_options().level, Some(9));
    }

    #[test]
    fn test_settings_manager_load_save_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let settings = manager.load_sync().unwrap();
        assert_eq!(settings, &GallerySettings::default());

        let mut new_settings = GallerySettings::default();
        new_settings.dependencies.timeout_ms = 500;
        manager.update_sync(new_settings).unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().to_path_buf());
        let loaded = manager2.load_sync().unwrap();
        assert_eq!(loaded.dependencies.timeout_ms, 500);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{broken").unwrap();

        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());
        assert_eq!(manager.load_sync().unwrap(), &GallerySettings::default());
    }

    #[tokio::test]
    async fn test_settings_manager_async() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        manager.load().await.unwrap();

        let mut new_settings = GallerySettings::default();
        new_settings.dependencies.strict = true;
        manager.update(new_settings).await.unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().to_path_buf());
        assert!(manager2.load().await.unwrap().dependencies.strict);

        let reset = manager2.reset().await.unwrap();
        assert!(!reset.dependencies.strict);
    }
}
