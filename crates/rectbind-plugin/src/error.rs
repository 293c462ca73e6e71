//! Plugin-specific error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading bindings or calling into them
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin directory is not a directory
    #[error("Plugin directory is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to load plugin from file
    #[error("Failed to load plugin from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Plugin API version doesn't match host
    #[error("Plugin API version mismatch: expected {expected}, found {found} in {origin}")]
    VersionMismatch {
        expected: u32,
        found: u32,
        origin: String,
    },

    /// Duplicate plugin name
    #[error("Duplicate plugin name: {0}")]
    DuplicatePlugin(String),

    /// Duplicate class name
    #[error("Duplicate class name '{class}' from plugin '{plugin}'")]
    DuplicateClass { class: String, plugin: String },

    /// Invalid class or method metadata from plugin
    #[error("Invalid class info from plugin: {0}")]
    InvalidClassInfo(String),

    /// No loaded plugin provides the class
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Constructor or method call reported failure
    #[error("{class}.{method} failed: {message}")]
    InvocationFailed {
        class: String,
        method: String,
        message: String,
    },
}
