//! Configuration management for Orrery
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{OrreryError, Result};
use crate::panel::UpdateMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Upstream phase endpoint configuration
    pub source: SourceConfig,

    /// Panel controller configuration
    pub panel: PanelConfig,

    /// Model catalog for the viewer's model selector
    pub models: ModelsConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream phase endpoint parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SourceConfig {
    /// URL returning `{"angle": <number|null>}`
    pub url: String,

    /// Automatic-mode polling interval in seconds
    pub poll_interval_secs: u64,
}

/// Panel controller defaults
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PanelConfig {
    /// Update mode active at startup
    pub initial_mode: UpdateMode,
}

/// A single selectable model in the viewer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelItem {
    /// Stable identifier used by the selection API
    pub id: String,

    /// Human-readable label for the dropdown
    pub label: String,

    /// Asset file name, resolved against `models.assets_dir`
    pub asset: String,

    /// Name of the scene node the panel attaches to, if the asset has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_anchor: Option<String>,
}

/// Model catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the model asset files
    pub assets_dir: String,

    /// Model selected at startup
    pub default_model: String,

    /// Selectable models
    pub items: Vec<ModelItem>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Directory holding the static viewer frontend
    pub ui_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/api/phase".to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            initial_mode: UpdateMode::Automatic,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            assets_dir: "./webui/models".to_string(),
            default_model: "turbine".to_string(),
            items: vec![
                ModelItem {
                    id: "turbine".to_string(),
                    label: "Turbine assembly".to_string(),
                    asset: "turbine.glb".to_string(),
                    panel_anchor: Some("PanelMount".to_string()),
                },
                ModelItem {
                    id: "gearbox".to_string(),
                    label: "Gearbox".to_string(),
                    asset: "gearbox.glb".to_string(),
                    panel_anchor: None,
                },
            ],
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
            ui_dir: "./webui".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/orrery.log".to_string(),
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            panel: PanelConfig::default(),
            models: ModelsConfig::default(),
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "orrery_config.yaml",
            "/data/orrery_config.yaml",
            "/etc/orrery/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.url.is_empty() {
            return Err(OrreryError::validation(
                "source.url",
                "Endpoint URL cannot be empty",
            ));
        }

        if !self.source.url.starts_with("http://") && !self.source.url.starts_with("https://") {
            return Err(OrreryError::validation(
                "source.url",
                "Endpoint URL must be http(s)",
            ));
        }

        if self.source.poll_interval_secs == 0 {
            return Err(OrreryError::validation(
                "source.poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.web.port == 0 {
            return Err(OrreryError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        if self.models.items.is_empty() {
            return Err(OrreryError::validation(
                "models.items",
                "At least one model must be configured",
            ));
        }

        for item in &self.models.items {
            if item.id.is_empty() {
                return Err(OrreryError::validation(
                    "models.items",
                    "Model id cannot be empty",
                ));
            }
            let duplicates = self
                .models
                .items
                .iter()
                .filter(|other| other.id == item.id)
                .count();
            if duplicates > 1 {
                return Err(OrreryError::validation(
                    "models.items",
                    "Model ids must be unique",
                ));
            }
        }

        if !self
            .models
            .items
            .iter()
            .any(|item| item.id == self.models.default_model)
        {
            return Err(OrreryError::validation(
                "models.default_model",
                "Default model is not in the catalog",
            ));
        }

        Ok(())
    }
}
