//! Storage configuration
//!
//! Read from TOML. Every field has a default so a partial file is enough.

use crate::asset::AssetType;
use crate::error::{Result, StorageError};
use crate::local::DEFAULT_MEDIA_DIR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the user's home holding `config.toml`
pub const CONFIG_DIR: &str = ".media-storage";

/// Endpoints and local media settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Host serving project documents
    #[serde(default = "default_project_host")]
    pub project_host: String,
    /// Host serving costumes, backdrops and sounds
    #[serde(default = "default_asset_host")]
    pub asset_host: String,
    /// Directory bundled media is read from
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    /// Asset types read from `media_dir`
    #[serde(default = "default_local_types")]
    pub local_types: Vec<AssetType>,
    /// Directory the file fetcher resolves request paths under
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Base URL for relative requests made over HTTP
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_project_host() -> String {
    "https://projects.scratch.mit.edu".to_string()
}

fn default_asset_host() -> String {
    "https://assets.scratch.mit.edu".to_string()
}

fn default_media_dir() -> String {
    DEFAULT_MEDIA_DIR.to_string()
}

fn default_local_types() -> Vec<AssetType> {
    vec![AssetType::ImageVector, AssetType::ImageBitmap, AssetType::Sound]
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            project_host: default_project_host(),
            asset_host: default_asset_host(),
            media_dir: default_media_dir(),
            local_types: default_local_types(),
            root_dir: default_root_dir(),
            base_url: None,
        }
    }
}

impl StorageConfig {
    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: StorageConfig =
            toml::from_str(contents).map_err(|e| StorageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, else from `~/.media-storage/config.toml` when present,
    /// else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            let contents = fs::read_to_string(config_path)?;
            return Self::from_toml_str(&contents);
        }

        if let Some(default_config) = Self::default_path() {
            if default_config.exists() {
                log::debug!("Reading configuration from {}", default_config.display());
                let contents = fs::read_to_string(&default_config)?;
                return Self::from_toml_str(&contents);
            }
        }

        Ok(Self::default())
    }

    /// `~/.media-storage/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join("config.toml"))
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StorageError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let hosts = [("project_host", &self.project_host), ("asset_host", &self.asset_host)];
        for (name, host) in hosts {
            if host.ends_with('/') {
                return Err(StorageError::Config(format!(
                    "{} must not end with '/': {}",
                    name, host
                )));
            }
        }
        if self.media_dir.is_empty() {
            return Err(StorageError::Config("media_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.media_dir, "medialibraries");
        assert_eq!(config.local_types.len(), 3);
        assert!(!config.local_types.contains(&AssetType::Project));
    }

    #[test]
    fn test_partial_toml() {
        let config = StorageConfig::from_toml_str(
            r#"
            asset_host = "http://localhost:8601"
            local_types = ["Sound"]
            "#,
        )
        .unwrap();

        assert_eq!(config.asset_host, "http://localhost:8601");
        assert_eq!(config.local_types, vec![AssetType::Sound]);
        assert_eq!(config.project_host, "https://projects.scratch.mit.edu");
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let result = StorageConfig::from_toml_str(r#"project_host = "http://p/""#);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = StorageConfig::from_toml_str(r#"local_types = ["Font"]"#);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "media_dir = \"media\"\nroot_dir = \"/srv/gui\"\n").unwrap();

        let config = StorageConfig::load(Some(&path)).unwrap();
        assert_eq!(config.media_dir, "media");
        assert_eq!(config.root_dir, PathBuf::from("/srv/gui"));

        let missing = StorageConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(missing, Err(StorageError::Io(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = StorageConfig {
            base_url: Some("http://localhost:8601/".to_string()),
            ..StorageConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(StorageConfig::from_toml_str(&text).unwrap(), config);
    }
}
