pub mod app_config;

// Re-export common types for convenience
pub use app_config::{AppConfig, LoggingConfig, PluginConfig, UiConfig, CONFIG_FILE_NAME};
