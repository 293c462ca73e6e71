//! Host-side view of loaded bindings
//!
//! [`ClassRegistry`] owns the plugin loader and wraps every exported class in a
//! [`BoundClass`] adapter. Constructing a class yields an [`Instance`], which
//! owns the object's JSON state; dropping the instance releases the object.

use anyhow::{Context, Result};
use rectbind_plugin::{
    LoadStats, PluginCallResult, PluginClassRef, PluginError, PluginLoader,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata for one method of a bound class
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Wraps an ABI-stable plugin class with its metadata decoded
pub struct BoundClass {
    class_ref: PluginClassRef,
    name: String,
    description: String,
    constructor: Value,
    methods: Vec<MethodSpec>,
    plugin_name: String,
}

impl BoundClass {
    /// Create an adapter, failing if the class publishes malformed schemas
    pub fn new(class_ref: PluginClassRef, plugin_name: impl Into<String>) -> Result<Self> {
        let info = (class_ref.info)();

        let constructor: Value = serde_json::from_str(info.constructor_json.as_str())
            .map_err(|e| anyhow::anyhow!("Invalid constructor JSON from plugin: {}", e))?;

        let methods = (class_ref.methods)()
            .into_iter()
            .map(|m| {
                let parameters = serde_json::from_str(m.parameters_json.as_str()).map_err(|e| {
                    PluginError::InvalidClassInfo(format!(
                        "parameters of {}.{} are not JSON: {}",
                        info.name, m.name, e
                    ))
                })?;
                Ok(MethodSpec {
                    name: m.name.to_string(),
                    description: m.description.to_string(),
                    parameters,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            class_ref,
            name: info.name.to_string(),
            description: info.description.to_string(),
            constructor,
            methods,
            plugin_name: plugin_name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema of the constructor arguments
    pub fn constructor(&self) -> &Value {
        &self.constructor
    }

    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    /// Name of the plugin this class came from
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    /// Construct a new instance from positional arguments
    pub fn construct(self: &Arc<Self>, args: &[Value]) -> Result<Instance> {
        let args_json = serde_json::to_string(args)?;
        debug!(class = %self.name, args = %args_json, "constructing instance");

        let result = (self.class_ref.construct)(args_json.as_str().into());
        let state = self.check(result, "<init>")?.0;

        Ok(Instance {
            class: Arc::clone(self),
            state,
        })
    }

    /// Turn a plugin result into `(state, output)`
    fn check(&self, result: PluginCallResult, method: &str) -> Result<(String, Value)> {
        if !result.success {
            return Err(PluginError::InvocationFailed {
                class: self.name.clone(),
                method: method.to_string(),
                message: result
                    .error_message()
                    .unwrap_or("unknown error")
                    .to_string(),
            }
            .into());
        }

        let output = match result.output.as_str() {
            "" => Value::Null,
            text => serde_json::from_str(text)
                .with_context(|| format!("{}.{} returned invalid JSON", self.name, method))?,
        };

        Ok((result.state.to_string(), output))
    }
}

impl fmt::Debug for BoundClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundClass")
            .field("name", &self.name)
            .field("plugin_name", &self.plugin_name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// A live object owned by the host
#[derive(Debug, Clone)]
pub struct Instance {
    class: Arc<BoundClass>,
    state: String,
}

impl Instance {
    /// Invoke a method. On success the instance adopts the state the binding
    /// returned, so mutating methods take effect here.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        if !self.class.has_method(method) {
            return Err(PluginError::InvocationFailed {
                class: self.class.name.clone(),
                method: method.to_string(),
                message: "no such method".to_string(),
            }
            .into());
        }

        let args_json = serde_json::to_string(args)?;
        debug!(class = %self.class.name, method, args = %args_json, "invoking method");

        let result = (self.class.class_ref.invoke)(
            self.state.as_str().into(),
            method.into(),
            args_json.as_str().into(),
        );
        let (state, output) = self.class.check(result, method)?;
        self.state = state;
        Ok(output)
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// The object's serialized state
    pub fn state(&self) -> &str {
        &self.state
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.class.name, self.state)
    }
}

/// All classes the host can instantiate
pub struct ClassRegistry {
    loader: PluginLoader,
    classes: BTreeMap<String, Arc<BoundClass>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            loader: PluginLoader::new(),
            classes: BTreeMap::new(),
        }
    }

    /// Registry with the builtin rectangle binding already registered
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_builtin()?;
        Ok(registry)
    }

    /// Register the bindings linked into this binary
    pub fn register_builtin(&mut self) -> Result<usize> {
        let added = self
            .loader
            .register_module(rectbind_rectangle::module())
            .context("registering builtin rectangle binding")?;
        self.refresh();
        Ok(added)
    }

    /// Load every binding library in `dir`
    pub fn load_directory(&mut self, dir: &Path) -> Result<LoadStats> {
        let stats = self.loader.load_directory(dir)?;
        self.refresh();
        Ok(stats)
    }

    /// Rebuild the class table; a class that cannot be bound is logged and skipped
    fn refresh(&mut self) {
        let mut classes = BTreeMap::new();
        for (class_ref, plugin_name) in self.loader.all_classes() {
            match BoundClass::new(class_ref, plugin_name) {
                Ok(bound) => {
                    classes.insert(bound.name().to_string(), Arc::new(bound));
                }
                Err(e) => warn!("Skipping class from plugin '{}': {:#}", plugin_name, e),
            }
        }
        self.classes = classes;
    }

    /// Look up a class by its script-visible name
    pub fn class(&self, name: &str) -> Result<Arc<BoundClass>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::UnknownClass(name.to_string()).into())
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<BoundClass>> {
        self.classes.values()
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi_stable::prefix_type::PrefixTypeTrait;
    use abi_stable::std_types::{RStr, RString, RVec};
    use rectbind_plugin::{PluginClass, PluginClassInfo, PluginMethodInfo, PluginModule};
    use serde_json::json;

    fn rectangle(args: &[Value]) -> Instance {
        let registry = ClassRegistry::with_builtin().unwrap();
        registry.class("Rectangle").unwrap().construct(args).unwrap()
    }

    #[test]
    fn test_builtin_registration() {
        let registry = ClassRegistry::with_builtin().unwrap();
        assert_eq!(registry.class_names(), vec!["Rectangle".to_string()]);
        assert_eq!(registry.loader().plugin_count(), 1);

        let class = registry.class("Rectangle").unwrap();
        assert_eq!(class.plugin_name(), "rectangle");
        assert!(class.has_method("getArea"));
        assert!(class.has_method("move"));
        assert!(!class.has_method("rotate"));
    }

    extern "C" fn misdescribed_version() -> u32 {
        rectbind_plugin::PLUGIN_API_VERSION
    }

    extern "C" fn misdescribed_name() -> RString {
        RString::from("misdescribed")
    }

    extern "C" fn misdescribed_info() -> PluginClassInfo {
        PluginClassInfo::new("Misdescribed", "Method schema is not JSON", "{}")
    }

    extern "C" fn misdescribed_methods() -> RVec<PluginMethodInfo> {
        RVec::from(vec![PluginMethodInfo::new("m", "", "not json")])
    }

    extern "C" fn misdescribed_construct(_args: RStr<'_>) -> PluginCallResult {
        PluginCallResult::success("{}", "null")
    }

    extern "C" fn misdescribed_invoke(
        state: RStr<'_>,
        _method: RStr<'_>,
        _args: RStr<'_>,
    ) -> PluginCallResult {
        PluginCallResult::success(state.as_str(), "null")
    }

    static MISDESCRIBED: PluginClass = PluginClass {
        info: misdescribed_info,
        methods: misdescribed_methods,
        construct: misdescribed_construct,
        invoke: misdescribed_invoke,
        initialize: None,
    };

    extern "C" fn misdescribed_classes() -> RVec<PluginClassRef> {
        RVec::from(vec![&MISDESCRIBED])
    }

    #[test]
    fn test_bad_method_schema_does_not_poison_registry() {
        let mut registry = ClassRegistry::new();
        let module = PluginModule {
            api_version: misdescribed_version,
            get_classes: misdescribed_classes,
            plugin_name: misdescribed_name,
            shutdown: None,
        }
        .leak_into_prefix();

        let err = registry.loader.register_module(module).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::InvalidClassInfo(_))
        ));
        assert_eq!(registry.loader().plugin_count(), 0);

        registry.register_builtin().unwrap();
        assert_eq!(registry.class_names(), vec!["Rectangle".to_string()]);
    }

    #[test]
    fn test_unbindable_class_is_skipped() {
        let mut registry = ClassRegistry::with_builtin().unwrap();
        assert!(BoundClass::new(&MISDESCRIBED, "misdescribed").is_err());

        // Rebuilding the table keeps every class that does bind
        registry.refresh();
        assert_eq!(registry.class_names(), vec!["Rectangle".to_string()]);
    }

    #[test]
    fn test_builtin_registered_twice_fails() {
        let mut registry = ClassRegistry::with_builtin().unwrap();
        assert!(registry.register_builtin().is_err());
        assert_eq!(registry.class_names().len(), 1);
    }

    #[test]
    fn test_unknown_class() {
        let registry = ClassRegistry::with_builtin().unwrap();
        let err = registry.class("Circle").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::UnknownClass(name)) if name == "Circle"
        ));
    }

    #[test]
    fn test_worked_example_through_host() {
        let mut r = rectangle(&[json!(2), json!(4), json!(6), json!(8)]);
        assert_eq!(r.call("getLength", &[]).unwrap(), json!(4));
        assert_eq!(r.call("getHeight", &[]).unwrap(), json!(4));
        assert_eq!(r.call("getArea", &[]).unwrap(), json!(16));
    }

    #[test]
    fn test_move_persists_in_instance() {
        let mut r = rectangle(&[json!(0), json!(0), json!(3), json!(5)]);
        assert_eq!(r.call("move", &[json!(2), json!(-2)]).unwrap(), Value::Null);
        assert_eq!(r.call("getCorners", &[]).unwrap(), json!([2, -2, 5, 3]));
        assert_eq!(r.call("getArea", &[]).unwrap(), json!(15));
        assert_eq!(r.to_string(), r#"Rectangle {"x0":2,"y0":-2,"x1":5,"y1":3}"#);
    }

    #[test]
    fn test_cloned_instances_are_independent() {
        let original = rectangle(&[json!(0), json!(0), json!(1), json!(1)]);
        let mut copy = original.clone();
        copy.call("move", &[json!(5), json!(5)]).unwrap();
        assert_ne!(copy.state(), original.state());
    }

    #[test]
    fn test_failed_call_keeps_state() {
        let mut r = rectangle(&[json!(0), json!(0), json!(1), json!(1)]);
        let before = r.state().to_string();

        let err = r.call("move", &[json!(1)]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::InvocationFailed { method, .. }) if method == "move"
        ));
        assert_eq!(r.state(), before);
    }

    #[test]
    fn test_unknown_method_rejected_by_host() {
        let mut r = rectangle(&[json!(0), json!(0), json!(1), json!(1)]);
        let err = r.call("rotate", &[]).unwrap_err();
        assert!(err.to_string().contains("no such method"));
    }

    #[test]
    fn test_bad_constructor_args() {
        let registry = ClassRegistry::with_builtin().unwrap();
        let class = registry.class("Rectangle").unwrap();
        let err = class.construct(&[json!(1), json!(2)]).unwrap_err();
        assert!(err.to_string().starts_with("Rectangle.<init> failed"));
    }
}
