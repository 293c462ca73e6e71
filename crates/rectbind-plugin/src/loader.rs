//! Plugin discovery and loading

use crate::abi::{PluginClassRef, PluginModuleRef, PLUGIN_API_VERSION};
use crate::error::PluginError;
use abi_stable::library::lib_header_from_path;
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Statistics from loading plugins
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    /// Total plugin files found
    pub total: usize,
    /// Successfully loaded plugins
    pub loaded: usize,
    /// Failed to load plugins
    pub failed: usize,
    /// Total classes loaded across all plugins
    pub classes_loaded: usize,
}

/// Where a loaded plugin came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// Dynamic library on disk
    Library(PathBuf),
    /// Linked into the host binary
    Builtin,
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Library(path) => write!(f, "{}", path.display()),
            PluginSource::Builtin => write!(f, "<builtin>"),
        }
    }
}

/// A loaded plugin with its metadata
pub struct LoadedPlugin {
    pub source: PluginSource,
    pub name: String,
    /// Classes provided by this plugin
    pub classes: Vec<PluginClassRef>,
    module: PluginModuleRef,
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("source", &self.source)
            .field("name", &self.name)
            .field("classes_count", &self.classes.len())
            .finish()
    }
}

/// Plugin loader that discovers binding libraries and tracks their classes
pub struct PluginLoader {
    plugins: Vec<LoadedPlugin>,
}

impl PluginLoader {
    /// Create a new empty plugin loader
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Load all plugins from a directory
    ///
    /// Scans the directory (not recursively) for dynamic library files and
    /// attempts to load each one. A missing directory yields empty stats; a
    /// library that fails to load is counted and logged but does not abort
    /// the scan.
    pub fn load_directory(&mut self, dir: &Path) -> Result<LoadStats> {
        let mut stats = LoadStats::default();

        if !dir.exists() {
            info!("Plugin directory does not exist: {}", dir.display());
            return Ok(stats);
        }

        if !dir.is_dir() {
            return Err(PluginError::NotADirectory(dir.to_path_buf()).into());
        }

        info!("Scanning plugin directory: {}", dir.display());

        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !Self::is_plugin_library(path) {
                continue;
            }

            stats.total += 1;

            match self.load_plugin(path) {
                Ok(class_count) => {
                    stats.loaded += 1;
                    stats.classes_loaded += class_count;
                    info!(
                        "Loaded plugin: {} ({} classes)",
                        path.display(),
                        class_count
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    error!("Failed to load plugin {}: {}", path.display(), e);
                }
            }
        }

        Ok(stats)
    }

    /// Load a single plugin library, returning the number of classes it adds
    pub fn load_plugin(&mut self, path: &Path) -> Result<usize> {
        debug!("Loading plugin from: {}", path.display());

        // Going through the library header instead of `RootModule::load_from_file`
        // keeps one root module per library rather than one per process.
        let module = lib_header_from_path(path)
            .and_then(|header| header.init_root_module::<PluginModuleRef>())
            .map_err(|e| PluginError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.add_module(module, PluginSource::Library(path.to_path_buf()))
    }

    /// Register a module linked into the host instead of loaded from disk
    pub fn register_module(&mut self, module: PluginModuleRef) -> Result<usize> {
        self.add_module(module, PluginSource::Builtin)
    }

    fn add_module(&mut self, module: PluginModuleRef, source: PluginSource) -> Result<usize> {
        let plugin_version = (module.api_version())();
        if plugin_version != PLUGIN_API_VERSION {
            return Err(PluginError::VersionMismatch {
                expected: PLUGIN_API_VERSION,
                found: plugin_version,
                origin: source.to_string(),
            }
            .into());
        }

        let plugin_name = (module.plugin_name())().to_string();
        debug!("Plugin '{}' passed version check", plugin_name);

        if self.plugins.iter().any(|p| p.name == plugin_name) {
            return Err(PluginError::DuplicatePlugin(plugin_name).into());
        }

        let classes: Vec<PluginClassRef> = (module.get_classes())().into_iter().collect();

        for class in &classes {
            let info = (class.info)();
            let class_name = info.name.as_str();

            if class_name.is_empty() {
                return Err(PluginError::InvalidClassInfo(format!(
                    "plugin '{}' exports a class without a name",
                    plugin_name
                ))
                .into());
            }
            if let Err(e) = serde_json::from_str::<serde_json::Value>(info.constructor_json.as_str())
            {
                return Err(PluginError::InvalidClassInfo(format!(
                    "constructor schema of '{}' is not JSON: {}",
                    class_name, e
                ))
                .into());
            }
            for method in (class.methods)() {
                if let Err(e) =
                    serde_json::from_str::<serde_json::Value>(method.parameters_json.as_str())
                {
                    return Err(PluginError::InvalidClassInfo(format!(
                        "parameters of {}.{} are not JSON: {}",
                        class_name, method.name, e
                    ))
                    .into());
                }
            }
            if self.find_class(class_name).is_some()
                || classes
                    .iter()
                    .filter(|c| (c.info)().name.as_str() == class_name)
                    .count()
                    > 1
            {
                return Err(PluginError::DuplicateClass {
                    class: class_name.to_string(),
                    plugin: plugin_name,
                }
                .into());
            }
        }

        for class in &classes {
            if let Some(init) = class.initialize {
                let context = "{}"; // Empty context for now
                if !init(context.into()) {
                    warn!(
                        "Class '{}' initialization failed",
                        (class.info)().name.as_str()
                    );
                }
            }
        }

        let class_count = classes.len();
        self.plugins.push(LoadedPlugin {
            source,
            name: plugin_name,
            classes,
            module,
        });

        Ok(class_count)
    }

    /// Check if a path is a plugin library based on extension
    fn is_plugin_library(path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }

        let Some(ext) = path.extension() else {
            return false;
        };

        #[cfg(target_os = "macos")]
        let expected = "dylib";

        #[cfg(target_os = "linux")]
        let expected = "so";

        #[cfg(target_os = "windows")]
        let expected = "dll";

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let expected = "so";

        ext == expected
    }

    /// Get all loaded plugins
    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// Get all classes from all loaded plugins with their plugin name
    pub fn all_classes(&self) -> impl Iterator<Item = (PluginClassRef, &str)> {
        self.plugins
            .iter()
            .flat_map(|p| p.classes.iter().map(move |c| (*c, p.name.as_str())))
    }

    /// Find a class by name across all loaded plugins
    pub fn find_class(&self, name: &str) -> Option<PluginClassRef> {
        self.all_classes()
            .map(|(class, _)| class)
            .find(|class| (class.info)().name.as_str() == name)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn class_count(&self) -> usize {
        self.plugins.iter().map(|p| p.classes.len()).sum()
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginLoader {
    fn drop(&mut self) {
        // Libraries stay mapped for the life of the process.
        for plugin in &self.plugins {
            if let Some(shutdown) = plugin.module.shutdown() {
                debug!("Shutting down plugin '{}' ({})", plugin.name, plugin.source);
                shutdown();
            }
        }
    }
}

/// Expand tilde (~) in paths to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{PluginCallResult, PluginClass, PluginClassInfo, PluginMethodInfo, PluginModule};
    use abi_stable::prefix_type::PrefixTypeTrait;
    use abi_stable::std_types::{RStr, RString, RVec};
    use std::path::Path;

    extern "C" fn counter_info() -> PluginClassInfo {
        PluginClassInfo::new("Counter", "Counts things", r#"{"type": "array"}"#)
    }

    extern "C" fn broken_info() -> PluginClassInfo {
        PluginClassInfo::new("Broken", "Bad schema", "not json")
    }

    extern "C" fn no_methods() -> RVec<PluginMethodInfo> {
        RVec::new()
    }

    extern "C" fn construct(_args: RStr<'_>) -> PluginCallResult {
        PluginCallResult::success("0", "null")
    }

    extern "C" fn invoke(state: RStr<'_>, _method: RStr<'_>, _args: RStr<'_>) -> PluginCallResult {
        PluginCallResult::success(state.as_str(), "null")
    }

    extern "C" fn refuse_init(_context: RStr<'_>) -> bool {
        false
    }

    static COUNTER: PluginClass = PluginClass {
        info: counter_info,
        methods: no_methods,
        construct,
        invoke,
        initialize: Some(refuse_init),
    };

    extern "C" fn sloppy_info() -> PluginClassInfo {
        PluginClassInfo::new("Sloppy", "Bad method schema", "{}")
    }

    extern "C" fn sloppy_methods() -> RVec<PluginMethodInfo> {
        RVec::from(vec![PluginMethodInfo::new("poke", "Pokes", "not json")])
    }

    static SLOPPY: PluginClass = PluginClass {
        info: sloppy_info,
        methods: sloppy_methods,
        construct,
        invoke,
        initialize: None,
    };

    static BROKEN: PluginClass = PluginClass {
        info: broken_info,
        methods: no_methods,
        construct,
        invoke,
        initialize: None,
    };

    extern "C" fn current_version() -> u32 {
        PLUGIN_API_VERSION
    }

    extern "C" fn future_version() -> u32 {
        PLUGIN_API_VERSION + 1
    }

    extern "C" fn counters_name() -> RString {
        RString::from("counters")
    }

    extern "C" fn other_name() -> RString {
        RString::from("other")
    }

    extern "C" fn counter_classes() -> RVec<PluginClassRef> {
        RVec::from(vec![&COUNTER])
    }

    extern "C" fn broken_classes() -> RVec<PluginClassRef> {
        RVec::from(vec![&BROKEN])
    }

    extern "C" fn sloppy_classes() -> RVec<PluginClassRef> {
        RVec::from(vec![&SLOPPY])
    }

    fn module(
        api_version: extern "C" fn() -> u32,
        plugin_name: extern "C" fn() -> RString,
        get_classes: extern "C" fn() -> RVec<PluginClassRef>,
    ) -> PluginModuleRef {
        PluginModule {
            api_version,
            get_classes,
            plugin_name,
            shutdown: None,
        }
        .leak_into_prefix()
    }

    #[test]
    fn test_register_module() {
        let mut loader = PluginLoader::new();
        let added = loader
            .register_module(module(current_version, counters_name, counter_classes))
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(loader.plugin_count(), 1);
        assert_eq!(loader.class_count(), 1);
        assert_eq!(loader.plugins()[0].source, PluginSource::Builtin);
        assert!(loader.find_class("Counter").is_some());
        assert!(loader.find_class("Missing").is_none());

        let (_, plugin) = loader.all_classes().next().unwrap();
        assert_eq!(plugin, "counters");
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut loader = PluginLoader::new();
        let err = loader
            .register_module(module(future_version, counters_name, counter_classes))
            .unwrap_err();

        match err.downcast_ref::<PluginError>() {
            Some(PluginError::VersionMismatch { expected, found, .. }) => {
                assert_eq!(*expected, PLUGIN_API_VERSION);
                assert_eq!(*found, PLUGIN_API_VERSION + 1);
            }
            other => panic!("Expected VersionMismatch, got {:?}", other),
        }
        assert_eq!(loader.plugin_count(), 0);
    }

    #[test]
    fn test_duplicate_plugin_rejected() {
        let mut loader = PluginLoader::new();
        loader
            .register_module(module(current_version, counters_name, counter_classes))
            .unwrap();
        let err = loader
            .register_module(module(current_version, counters_name, counter_classes))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::DuplicatePlugin(name)) if name == "counters"
        ));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut loader = PluginLoader::new();
        loader
            .register_module(module(current_version, counters_name, counter_classes))
            .unwrap();
        let err = loader
            .register_module(module(current_version, other_name, counter_classes))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::DuplicateClass { class, plugin }) if class == "Counter" && plugin == "other"
        ));
        assert_eq!(loader.plugin_count(), 1);
    }

    #[test]
    fn test_invalid_constructor_schema_rejected() {
        let mut loader = PluginLoader::new();
        let err = loader
            .register_module(module(current_version, other_name, broken_classes))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::InvalidClassInfo(_))
        ));
    }

    #[test]
    fn test_invalid_method_schema_rejected() {
        let mut loader = PluginLoader::new();
        let err = loader
            .register_module(module(current_version, other_name, sloppy_classes))
            .unwrap_err();

        match err.downcast_ref::<PluginError>() {
            Some(PluginError::InvalidClassInfo(message)) => {
                assert!(message.contains("Sloppy.poke"));
            }
            other => panic!("Expected InvalidClassInfo, got {:?}", other),
        }
        assert_eq!(loader.plugin_count(), 0);
        assert!(loader.find_class("Sloppy").is_none());
    }

    #[test]
    fn test_is_plugin_library() {
        // Non-existent paths always return false (file check first)
        assert!(!PluginLoader::is_plugin_library(Path::new(
            "/tmp/nonexistent/librectangle.so"
        )));

        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hello").unwrap();
        assert!(!PluginLoader::is_plugin_library(&text));
        assert!(!PluginLoader::is_plugin_library(dir.path()));
    }

    #[test]
    fn test_load_missing_directory() {
        let mut loader = PluginLoader::new();
        let stats = loader
            .load_directory(Path::new("/tmp/rectbind-does-not-exist"))
            .unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(loader.plugin_count(), 0);
    }

    #[test]
    fn test_load_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plugins");
        std::fs::write(&file, "").unwrap();

        let mut loader = PluginLoader::new();
        let err = loader.load_directory(&file).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::NotADirectory(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_load_directory_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libgarbage.so"), b"not a shared object").unwrap();
        std::fs::write(dir.path().join("readme.md"), "ignored").unwrap();

        let mut loader = PluginLoader::new();
        let stats = loader.load_directory(dir.path()).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.loaded, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(loader.plugin_count(), 0);
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs_home().unwrap_or_else(|| PathBuf::from("/home/user"));

        let expanded = expand_tilde(Path::new("~/test"));
        assert!(expanded.starts_with(&home) || expanded == Path::new("~/test"));

        let absolute = expand_tilde(Path::new("/absolute/path"));
        assert_eq!(absolute, Path::new("/absolute/path"));
    }

    #[test]
    fn test_load_stats_default() {
        let stats = LoadStats::default();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.loaded, 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.classes_loaded, 0);
    }
}
