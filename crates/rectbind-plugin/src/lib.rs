//! Class bindings for rectbind
//!
//! This crate defines the ABI-stable boundary through which native types are
//! exposed to the rectbind scripting host, and the loader the host uses to
//! find them. Bindings are compiled as dynamic libraries (`.dylib` on macOS,
//! `.so` on Linux, `.dll` on Windows) or linked straight into the host.
//!
//! # For Binding Authors
//!
//! Describe each exposed type as a [`PluginClass`]: metadata, a method list,
//! a constructor and a single `invoke` entry point. Arguments, return values
//! and instance state all travel as JSON text.
//!
//! ```rust,ignore
//! use abi_stable::prefix_type::PrefixTypeTrait;
//! use abi_stable::std_types::{RStr, RString, RVec};
//! use rectbind_plugin::abi::{
//!     PluginCallResult, PluginClass, PluginClassInfo, PluginClassRef,
//!     PluginMethodInfo, PluginModule, PluginModuleRef, PLUGIN_API_VERSION,
//! };
//!
//! extern "C" fn info() -> PluginClassInfo {
//!     PluginClassInfo::new("Counter", "A counter", r#"{"type": "array"}"#)
//! }
//!
//! extern "C" fn methods() -> RVec<PluginMethodInfo> {
//!     RVec::from(vec![PluginMethodInfo::new("get", "Current value", "{}")])
//! }
//!
//! extern "C" fn construct(_args_json: RStr<'_>) -> PluginCallResult {
//!     PluginCallResult::success("0", "null")
//! }
//!
//! extern "C" fn invoke(state: RStr<'_>, method: RStr<'_>, _args: RStr<'_>) -> PluginCallResult {
//!     match method.as_str() {
//!         "get" => PluginCallResult::success(state.as_str(), state.as_str()),
//!         other => PluginCallResult::failure(format!("no method '{}'", other)),
//!     }
//! }
//!
//! static COUNTER: PluginClass = PluginClass {
//!     info,
//!     methods,
//!     construct,
//!     invoke,
//!     initialize: None,
//! };
//!
//! extern "C" fn api_version() -> u32 { PLUGIN_API_VERSION }
//! extern "C" fn plugin_name() -> RString { RString::from("counter") }
//! extern "C" fn get_classes() -> RVec<PluginClassRef> { RVec::from(vec![&COUNTER]) }
//!
//! #[abi_stable::export_root_module]
//! fn get_library() -> PluginModuleRef {
//!     PluginModule {
//!         api_version,
//!         get_classes,
//!         plugin_name,
//!         shutdown: None,
//!     }
//!     .leak_into_prefix()
//! }
//! ```
//!
//! # For Host Applications
//!
//! ```rust,ignore
//! use rectbind_plugin::loader::{expand_tilde, PluginLoader};
//! use std::path::Path;
//!
//! let mut loader = PluginLoader::new();
//! let stats = loader.load_directory(&expand_tilde(Path::new("~/.rectbind/plugins")))?;
//!
//! println!("Loaded {} plugins with {} classes", stats.loaded, stats.classes_loaded);
//! ```

pub mod abi;
pub mod error;
pub mod loader;

// Re-export commonly used types
pub use abi::{
    PluginCallResult, PluginClass, PluginClassInfo, PluginClassRef, PluginMethodInfo,
    PluginModule, PluginModuleRef, PLUGIN_API_VERSION,
};
pub use error::PluginError;
pub use loader::{expand_tilde, LoadStats, LoadedPlugin, PluginLoader, PluginSource};
