//! Rectangle binding for rectbind
//!
//! Exposes [`rectbind_geometry::Rectangle`] as the script class `Rectangle`.
//! The crate builds both as a dynamic library loadable from a plugin
//! directory and as an rlib the host links in directly through [`module`].
//!
//! # Building
//!
//! ```bash
//! cargo build --release -p rectbind-rectangle
//! ```
//!
//! # Installation
//!
//! ```bash
//! # Linux
//! cp target/release/librectbind_rectangle.so ~/.rectbind/plugins/
//!
//! # macOS
//! cp target/release/librectbind_rectangle.dylib ~/.rectbind/plugins/
//! ```
//!
//! The host already links this binding as a builtin, so loading the library
//! as well is reported as a duplicate plugin unless `plugins.builtin = false`.
//!
//! # Script usage
//!
//! ```text
//! r = Rectangle(2, 4, 6, 8)
//! print(r.getLength())
//! r.move(1, -1)
//! ```

use abi_stable::{
    prefix_type::PrefixTypeTrait,
    std_types::{RStr, RString, RVec},
};
use rectbind_geometry::Rectangle;
use rectbind_plugin::abi::{
    PluginCallResult, PluginClass, PluginClassInfo, PluginClassRef, PluginMethodInfo,
    PluginModule, PluginModuleRef, PLUGIN_API_VERSION,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Name the plugin registers under
pub const PLUGIN_NAME: &str = "rectangle";

/// Script-visible class name
pub const CLASS_NAME: &str = "Rectangle";

/// Constructor arguments, positional `[x0, y0, x1, y1]` or named
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CornerArgs {
    Positional(i32, i32, i32, i32),
    Named { x0: i32, y0: i32, x1: i32, y1: i32 },
}

impl From<CornerArgs> for Rectangle {
    fn from(args: CornerArgs) -> Self {
        match args {
            CornerArgs::Positional(x0, y0, x1, y1) | CornerArgs::Named { x0, y0, x1, y1 } => {
                Rectangle::new(x0, y0, x1, y1)
            }
        }
    }
}

/// Arguments of `move`, positional `[dx, dy]` or named
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoveArgs {
    Positional(i32, i32),
    Named { dx: i32, dy: i32 },
}

impl MoveArgs {
    fn deltas(self) -> (i32, i32) {
        match self {
            MoveArgs::Positional(dx, dy) | MoveArgs::Named { dx, dy } => (dx, dy),
        }
    }
}

extern "C" fn rectangle_info() -> PluginClassInfo {
    PluginClassInfo::new(
        CLASS_NAME,
        "Axis-aligned rectangle given by two opposite corners",
        r#"{
            "type": ["array", "object"],
            "items": {"type": "integer"},
            "minItems": 4,
            "maxItems": 4,
            "properties": {
                "x0": {"type": "integer"},
                "y0": {"type": "integer"},
                "x1": {"type": "integer"},
                "y1": {"type": "integer"}
            },
            "required": ["x0", "y0", "x1", "y1"]
        }"#,
    )
}

extern "C" fn rectangle_methods() -> RVec<PluginMethodInfo> {
    let no_args = r#"{"type": "array", "maxItems": 0}"#;
    RVec::from(vec![
        PluginMethodInfo::new("getLength", "Horizontal extent, x1 - x0", no_args),
        PluginMethodInfo::new("getHeight", "Vertical extent, y1 - y0", no_args),
        PluginMethodInfo::new("getArea", "Signed area, length * height", no_args),
        PluginMethodInfo::new(
            "move",
            "Shift both corners by (dx, dy)",
            r#"{
                "type": ["array", "object"],
                "items": {"type": "integer"},
                "minItems": 2,
                "maxItems": 2,
                "properties": {
                    "dx": {"type": "integer"},
                    "dy": {"type": "integer"}
                },
                "required": ["dx", "dy"]
            }"#,
        ),
        PluginMethodInfo::new("getCorners", "Coordinates as [x0, y0, x1, y1]", no_args),
    ])
}

extern "C" fn rectangle_construct(args_json: RStr<'_>) -> PluginCallResult {
    let args: CornerArgs = match serde_json::from_str(args_json.as_str()) {
        Ok(a) => a,
        Err(e) => return PluginCallResult::failure(format!("Invalid arguments: {}", e)),
    };

    respond(&Rectangle::from(args), Value::Null)
}

extern "C" fn rectangle_invoke(
    state_json: RStr<'_>,
    method: RStr<'_>,
    args_json: RStr<'_>,
) -> PluginCallResult {
    let mut rect: Rectangle = match serde_json::from_str(state_json.as_str()) {
        Ok(r) => r,
        Err(e) => return PluginCallResult::failure(format!("Invalid rectangle state: {}", e)),
    };

    let method = method.as_str();
    let args = args_json.as_str();

    let output = match method {
        "getLength" | "getHeight" | "getArea" | "getCorners" => {
            if let Err(message) = expect_no_args(method, args) {
                return PluginCallResult::failure(message);
            }
            match method {
                "getLength" => json!(rect.length()),
                "getHeight" => json!(rect.height()),
                "getArea" => json!(rect.area()),
                _ => json!([rect.x0(), rect.y0(), rect.x1(), rect.y1()]),
            }
        }
        "move" => {
            let (dx, dy) = match serde_json::from_str::<MoveArgs>(args) {
                Ok(a) => a.deltas(),
                Err(e) => return PluginCallResult::failure(format!("Invalid arguments: {}", e)),
            };
            rect.translate(dx, dy);
            Value::Null
        }
        other => {
            return PluginCallResult::failure(format!(
                "{} has no method '{}'",
                CLASS_NAME, other
            ))
        }
    };

    respond(&rect, output)
}

/// Accepts `[]`, `{}`, `null` or an empty string
fn expect_no_args(method: &str, args_json: &str) -> Result<(), String> {
    if args_json.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(args_json) {
        Ok(Value::Null) => Ok(()),
        Ok(Value::Array(items)) if items.is_empty() => Ok(()),
        Ok(Value::Object(fields)) if fields.is_empty() => Ok(()),
        Ok(_) => Err(format!("{} takes no arguments", method)),
        Err(e) => Err(format!("Invalid arguments: {}", e)),
    }
}

fn respond(rect: &Rectangle, output: Value) -> PluginCallResult {
    match serde_json::to_string(rect) {
        Ok(state) => PluginCallResult::success(state, output.to_string()),
        Err(e) => PluginCallResult::failure(format!("Failed to encode rectangle: {}", e)),
    }
}

/// Static class definition
static RECTANGLE_CLASS: PluginClass = PluginClass {
    info: rectangle_info,
    methods: rectangle_methods,
    construct: rectangle_construct,
    invoke: rectangle_invoke,
    initialize: None,
};

extern "C" fn api_version() -> u32 {
    PLUGIN_API_VERSION
}

extern "C" fn plugin_name() -> RString {
    RString::from(PLUGIN_NAME)
}

extern "C" fn get_classes() -> RVec<PluginClassRef> {
    RVec::from(vec![&RECTANGLE_CLASS])
}

/// Root module for linking the binding into a host directly
pub fn module() -> PluginModuleRef {
    PluginModule {
        api_version,
        get_classes,
        plugin_name,
        shutdown: None,
    }
    .leak_into_prefix()
}

/// Export the plugin module
///
/// This is the entry point the loader resolves in the dynamic library.
#[abi_stable::export_root_module]
fn get_library() -> PluginModuleRef {
    module()
}
