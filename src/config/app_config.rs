//! Application-level configuration
//!
//! Defines the top-level configuration: where bindings are loaded from,
//! logging, and REPL presentation.

use anyhow::{Context, Result};
use directories::BaseDirs;
use rectbind_plugin::expand_tilde;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedded default configuration file
const DEFAULT_CONFIG: &str = include_str!("../../rectbind.config.toml");

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "rectbind.config.toml";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub plugins: PluginConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the first location that has a config file
    ///
    /// Checks `./rectbind.config.toml`, `~/.rectbind/rectbind.config.toml`
    /// and `$RECTBIND_CONFIG`, then falls back to the embedded default.
    pub fn load() -> Result<Self> {
        if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_NAME) {
            return toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", CONFIG_FILE_NAME, e));
        }

        if let Some(base_dirs) = BaseDirs::new() {
            let home_config = base_dirs
                .home_dir()
                .join(".rectbind")
                .join(CONFIG_FILE_NAME);
            if let Ok(content) = std::fs::read_to_string(&home_config) {
                return toml::from_str(&content).map_err(|e| {
                    anyhow::anyhow!("Failed to parse {}: {}", home_config.display(), e)
                });
            }
        }

        if let Ok(config_path) = std::env::var("RECTBIND_CONFIG") {
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                return toml::from_str(&content)
                    .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", config_path, e));
            }
        }

        Self::embedded_default()
    }

    /// The configuration shipped inside the binary
    pub fn embedded_default() -> Result<Self> {
        toml::from_str(DEFAULT_CONFIG)
            .map_err(|e| anyhow::anyhow!("Failed to parse embedded default config: {}", e))
    }

    /// Load configuration from a specific file path
    /// If the file doesn't exist, creates it with default settings
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file {}: {}", path.display(), e)
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "Configuration file not found at {}. Creating with default settings...",
                    path.display()
                );

                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .context(format!("Failed to create directory {}", parent.display()))?;
                    }
                }

                std::fs::write(path, DEFAULT_CONFIG).context(format!(
                    "Failed to create config file at {}",
                    path.display()
                ))?;

                Self::embedded_default()
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level)),
        }

        if self.ui.prompt.is_empty() {
            return Err(anyhow::anyhow!("UI prompt cannot be empty"));
        }

        if self.plugins.enabled && self.plugins.dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!(
                "Plugin directory cannot be empty when plugins are enabled"
            ));
        }

        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("RECTBIND_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(dir) = std::env::var("RECTBIND_PLUGIN_DIR") {
            self.plugins.dir = PathBuf::from(dir);
        }
        if let Ok(enabled) = std::env::var("RECTBIND_PLUGINS_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.plugins.enabled = true,
                "0" | "false" | "no" | "off" => self.plugins.enabled = false,
                _ => {}
            }
        }
        if let Ok(prompt) = std::env::var("RECTBIND_PROMPT") {
            self.ui.prompt = prompt;
        }
    }

    /// Get a summary of the configuration
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Configuration loaded:\n");
        summary.push_str(&format!(
            "Plugins: {}\n",
            if self.plugins.enabled { "enabled" } else { "disabled" }
        ));
        summary.push_str(&format!("Plugin Directory: {}\n", self.plugins.dir.display()));
        summary.push_str(&format!(
            "Builtin Bindings: {}\n",
            if self.plugins.builtin { "yes" } else { "no" }
        ));
        summary.push_str(&format!("Logging Level: {}\n", self.logging.level));
        summary
    }
}

/// Binding discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Scan `dir` for binding libraries at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Register the bindings compiled into the binary
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Directory scanned for binding libraries (`~` is expanded)
    #[serde(default = "default_plugin_dir")]
    pub dir: PathBuf,
}

impl PluginConfig {
    /// `dir` with a leading `~` expanded
    pub fn resolved_dir(&self) -> PathBuf {
        expand_tilde(&self.dir)
    }
}

fn default_true() -> bool {
    true
}

fn default_plugin_dir() -> PathBuf {
    PathBuf::from("~/.rectbind/plugins")
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            builtin: true,
            dir: default_plugin_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// REPL prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "rectbind> ".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
        }
    }
}
