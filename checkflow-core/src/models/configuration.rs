//! Configuration data structures

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Logging level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Workflow engine limits and routing switches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Whether a creator may review their own request when otherwise eligible
    pub allow_self_review: bool,
    /// Upper bound on unit hierarchy walks
    pub max_hierarchy_depth: usize,
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub max_remarks_length: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            allow_self_review: true,
            max_hierarchy_depth: 32,
            max_title_length: 255,
            max_description_length: 5000,
            max_remarks_length: 1000,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Path of the JSON store document
    pub store_path: PathBuf,
    /// Logging verbosity level
    pub log_level: LogLevel,
    /// Server bind address
    pub server_host: String,
    /// Server port number
    pub server_port: u16,
    /// Engine settings
    pub engine: EngineSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            store_path: Self::default_store_path(),
            log_level: LogLevel::Info,
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            engine: EngineSettings::default(),
        }
    }
}

impl Configuration {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Configuration = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Return default configuration if file doesn't exist
            Ok(Configuration::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn default_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("Could not determine config directory")?;
        Ok(config_dir.join("checkflow").join("config.toml"))
    }

    /// Store document under the XDG data directory, or the working directory
    pub fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("checkflow").join("store.json"))
            .unwrap_or_else(|| PathBuf::from("checkflow-store.json"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.store_path.as_os_str().is_empty() {
            errors.push("store_path cannot be empty".to_string());
        }

        // Validate port (u16 is already 0-65535, so only check minimum)
        if self.server_port < 1024 {
            errors.push(
                "server_port must be at least 1024 (privileged ports not allowed)".to_string(),
            );
        }

        if self.engine.max_hierarchy_depth == 0 || self.engine.max_hierarchy_depth > 256 {
            errors.push("engine.max_hierarchy_depth must be between 1 and 256".to_string());
        }

        for (name, value) in [
            ("engine.max_title_length", self.engine.max_title_length),
            (
                "engine.max_description_length",
                self.engine.max_description_length,
            ),
            ("engine.max_remarks_length", self.engine.max_remarks_length),
        ] {
            if value == 0 {
                errors.push(format!("{} must be greater than 0", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
