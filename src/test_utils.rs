use crate::config::AppConfig;
use std::sync::{Mutex, OnceLock};

/// Global test utilities
///
/// Provides a process-wide mutex to serialize tests that mutate process-wide
/// state (like environment variables). Use this to avoid flaky tests when
/// `cargo test` runs tests in parallel.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Config with only the builtin bindings and no plugin directory scan
pub fn builtin_only_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.plugins.enabled = false;
    config.plugins.builtin = true;
    config
}
