// src/config.rs
//! Layer configuration stored as JSON in the user's config directory

use crate::error::{BuildingsError, Result};
use crate::map::url_template::UrlTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub url_template: UrlTemplate,
    pub zoom: u8,
    pub data_root: Option<PathBuf>,
    pub cache_relative_path: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub params: BTreeMap<String, String>, // static URL parameters
}

impl Default for LayerConfig {
    fn default() -> Self {
        let mut params = BTreeMap::new();
        params.insert("timeout".to_string(), "25".to_string());

        Self {
            url_template: UrlTemplate::default(),
            zoom: 15,
            data_root: None,
            cache_relative_path: "world/buildings".to_string(),
            timeout_secs: 30,
            user_agent: None,
            params,
        }
    }
}

impl LayerConfig {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BuildingsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| BuildingsError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to storage
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BuildingsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| BuildingsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.zoom > 22 {
            return Err(BuildingsError::Config(format!("Zoom {} is out of range (0-22)", self.zoom)));
        }
        if self.url_template.as_str().is_empty() {
            return Err(BuildingsError::Config("URL template is empty".to_string()));
        }
        Ok(())
    }

    /// Directory holding the cached responses
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let root = match &self.data_root {
            Some(root) => root.clone(),
            None => Self::home()?.join(".local").join("share").join("osm-buildings"),
        };
        Ok(root.join(&self.cache_relative_path))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::home()?.join(".config").join("osm-buildings").join("config.json"))
    }

    fn home() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| BuildingsError::Config("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home))
    }
}
