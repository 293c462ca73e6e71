//! ABI-stable types for the class binding interface
//!
//! A binding exposes native types as *classes*. Every value crossing the
//! boundary is JSON text: constructor and method arguments, the return value,
//! and the instance state itself. The host owns the state between calls, so a
//! binding never has to track live instances and there is no destroy entry
//! point.

use abi_stable::{
    declare_root_module_statics,
    library::RootModule,
    package_version_strings,
    sabi_types::VersionStrings,
    std_types::{ROption, RStr, RString, RVec},
    StableAbi,
};

/// Version of the binding API.
/// Bump this when making breaking changes to the plugin interface.
pub const PLUGIN_API_VERSION: u32 = 1;

/// ABI-stable result of constructing an instance or invoking a method
#[repr(C)]
#[derive(StableAbi, Debug, Clone)]
pub struct PluginCallResult {
    /// Whether the call succeeded
    pub success: bool,
    /// Instance state (JSON) after the call; empty on failure
    pub state: RString,
    /// Return value (JSON); `null` for methods without one
    pub output: RString,
    /// Error message if the call failed
    pub error: ROption<RString>,
}

impl PluginCallResult {
    /// Create a successful result
    pub fn success(state: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            state: RString::from(state.into()),
            output: RString::from(output.into()),
            error: ROption::RNone,
        }
    }

    /// Create a failure result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            state: RString::new(),
            output: RString::new(),
            error: ROption::RSome(RString::from(error.into())),
        }
    }

    /// Error message, if any
    pub fn error_message(&self) -> Option<&str> {
        match &self.error {
            ROption::RSome(e) => Some(e.as_str()),
            ROption::RNone => None,
        }
    }
}

/// ABI-stable method metadata
#[repr(C)]
#[derive(StableAbi, Debug, Clone)]
pub struct PluginMethodInfo {
    /// Method name as seen by scripts
    pub name: RString,
    /// Human-readable description
    pub description: RString,
    /// JSON Schema describing the method's parameters
    pub parameters_json: RString,
}

impl PluginMethodInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_json: impl Into<String>,
    ) -> Self {
        Self {
            name: RString::from(name.into()),
            description: RString::from(description.into()),
            parameters_json: RString::from(parameters_json.into()),
        }
    }
}

/// ABI-stable class metadata
#[repr(C)]
#[derive(StableAbi, Debug, Clone)]
pub struct PluginClassInfo {
    /// Unique class name
    pub name: RString,
    /// Human-readable description of the class
    pub description: RString,
    /// JSON Schema describing the constructor arguments
    pub constructor_json: RString,
}

impl PluginClassInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        constructor_json: impl Into<String>,
    ) -> Self {
        Self {
            name: RString::from(name.into()),
            description: RString::from(description.into()),
            constructor_json: RString::from(constructor_json.into()),
        }
    }
}

/// ABI-stable class interface that bindings implement.
///
/// Bindings create one static instance of this struct per exposed type.
#[repr(C)]
#[derive(StableAbi)]
pub struct PluginClass {
    /// Get class metadata (name, description, constructor schema)
    pub info: extern "C" fn() -> PluginClassInfo,

    /// List the methods instances of this class respond to
    pub methods: extern "C" fn() -> RVec<PluginMethodInfo>,

    /// Build a new instance from JSON-encoded constructor arguments.
    ///
    /// On success `state` holds the new instance and `output` is `null`.
    pub construct: extern "C" fn(args_json: RStr<'_>) -> PluginCallResult,

    /// Invoke `method` on the instance serialized in `state_json`.
    ///
    /// On success `state` holds the instance after the call, which differs
    /// from the input only for mutating methods.
    pub invoke: extern "C" fn(
        state_json: RStr<'_>,
        method: RStr<'_>,
        args_json: RStr<'_>,
    ) -> PluginCallResult,

    /// Optional: Initialize the class with host context
    ///
    /// Called once when the plugin is loaded. Returning `false` is reported
    /// by the host but does not unload the plugin.
    pub initialize: Option<extern "C" fn(context_json: RStr<'_>) -> bool>,
}

/// Reference to a PluginClass for use in collections
pub type PluginClassRef = &'static PluginClass;

/// Root module that plugins export.
///
/// The host loads this module and uses it to discover the plugin's classes.
#[repr(C)]
#[derive(StableAbi)]
#[sabi(kind(Prefix(prefix_ref = PluginModuleRef)))]
pub struct PluginModule {
    /// Must return `PLUGIN_API_VERSION` for compatibility
    pub api_version: extern "C" fn() -> u32,

    /// Get all classes provided by this plugin
    pub get_classes: extern "C" fn() -> RVec<PluginClassRef>,

    /// Get the plugin name for identification
    pub plugin_name: extern "C" fn() -> RString,

    /// Optional cleanup function called when the plugin is unloaded
    #[sabi(last_prefix_field)]
    pub shutdown: Option<extern "C" fn()>,
}

impl RootModule for PluginModuleRef {
    declare_root_module_statics! {PluginModuleRef}

    const BASE_NAME: &'static str = "rectbind_plugin";
    const NAME: &'static str = "rectbind_plugin";
    const VERSION_STRINGS: VersionStrings = package_version_strings!();
}
