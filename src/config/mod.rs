//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Photo capture settings
    pub capture: CaptureSettings,
    /// Text recognition settings
    pub recognition: RecognitionSettings,
    /// Camera permission settings
    pub permission: PermissionSettings,
    /// News API settings
    pub news: NewsSettings,
    /// Local storage settings
    pub storage: StorageSettings,
}

/// Capture-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Directory for captured photos, or empty for the data directory
    pub capture_dir: Option<PathBuf>,
    /// File name prefix for captured photos
    pub file_prefix: String,
    /// File extension for captured photos
    pub extension: String,
    /// Crop photos to the central region before recognition
    pub crop_to_center: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            capture_dir: None,
            file_prefix: "ocr_capture_".to_string(),
            extension: "jpg".to_string(),
            crop_to_center: true,
        }
    }
}

/// Text recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Tesseract language code (e.g., "eng")
    pub language: String,
    /// Fixed DPI hint, or empty to pick one from the image size
    pub dpi: Option<i32>,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: i32,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: None,
            page_segmentation_mode: 3,
        }
    }
}

/// How camera permission is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Ask on the console every time the capture flow starts
    #[default]
    Prompt,
    /// Treat the permission as already granted
    Grant,
    /// Refuse without asking
    Deny,
}

/// Permission settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSettings {
    pub camera: PermissionPolicy,
}

/// News API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    /// API base URL
    pub base_url: String,
    /// API key (also read from `NEWS_API_KEY`)
    pub api_key: Option<String>,
    /// Comma separated source identifiers
    pub sources: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            api_key: None,
            sources: "cnn".to_string(),
            timeout_secs: 15,
        }
    }
}

impl NewsSettings {
    /// API key from the config file, falling back to `NEWS_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("NEWS_API_KEY").ok().filter(|k| !k.trim().is_empty()))
    }
}

/// Local storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Favorites database path, or empty for the data directory
    pub database_path: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check capture defaults
        assert!(config.capture.capture_dir.is_none());
        assert_eq!(config.capture.file_prefix, "ocr_capture_");
        assert_eq!(config.capture.extension, "jpg");
        assert!(config.capture.crop_to_center);

        // Check recognition defaults
        assert_eq!(config.recognition.language, "eng");
        assert!(config.recognition.dpi.is_none());
        assert_eq!(config.recognition.page_segmentation_mode, 3);

        // Check permission and news defaults
        assert_eq!(config.permission.camera, PermissionPolicy::Prompt);
        assert_eq!(config.news.base_url, "https://newsapi.org");
        assert_eq!(config.news.sources, "cnn");
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.capture.capture_dir = Some(PathBuf::from("/tmp/captures"));
        config.capture.crop_to_center = false;
        config.permission.camera = PermissionPolicy::Grant;
        config.news.api_key = Some("secret".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.capture.capture_dir, Some(PathBuf::from("/tmp/captures")));
        assert!(!parsed.capture.crop_to_center);
        assert_eq!(parsed.permission.camera, PermissionPolicy::Grant);
        assert_eq!(parsed.news.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [permission]
            camera = "deny"

            [recognition]
            language = "fra"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.permission.camera, PermissionPolicy::Deny);
        assert_eq!(parsed.recognition.language, "fra");
        assert_eq!(parsed.recognition.page_segmentation_mode, 3);
        assert!(parsed.capture.crop_to_center);
        assert_eq!(parsed.news.sources, "cnn");
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.news.sources = "bbc-news".to_string();

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.news.sources, "bbc-news");
        assert_eq!(loaded.capture.file_prefix, config.capture.file_prefix);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_api_key_wins_over_env() {
        let settings = NewsSettings {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.resolved_api_key().as_deref(), Some("from-file"));
    }
}
