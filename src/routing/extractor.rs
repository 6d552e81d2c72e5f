//! Routing key extraction from call arguments.
//!
//! # Responsibilities
//! - Capture heterogeneous call arguments in one ordered list
//! - Read a named attribute (optionally a dotted path) from those arguments
//! - Apply the single-string shortcut and the blank-value skip rule
//!
//! # Design Decisions
//! - Field access goes through `serde::Serialize`: any argument type that
//!   serializes to a map or struct exposes its fields by name
//! - An argument that cannot be read for the attribute fails the whole call;
//!   it is never silently skipped. A `null` argument (`None`, `()`) counts as
//!   unreadable, a `null` field inside an argument counts as absent
//! - The single-string shortcut is decided by the argument's Rust type
//!   (`str`, `String` or a reference to one), not by how it serializes, so
//!   enums, chars and newtypes never take it
//! - Scanning stops at the first non-blank value

use serde::Serialize;
use serde_json::Value;

use crate::error::RouteError;

/// Builds a [`RouteArgs`] from a list of argument references.
///
/// ```
/// use db_router::route_args;
///
/// let args = route_args![&"42"];
/// assert_eq!(args.len(), 1);
/// ```
#[macro_export]
macro_rules! route_args {
    ($($arg:expr),* $(,)?) => {
        $crate::routing::RouteArgs::new()$(.arg($arg))*
    };
}

#[derive(Debug, Clone)]
enum ArgValue {
    Json(Value),
    /// Serialization failed; the argument cannot be introspected.
    Opaque,
}

/// One captured call argument.
#[derive(Debug, Clone)]
pub struct RouteArg {
    type_name: &'static str,
    is_string: bool,
    value: ArgValue,
}

fn is_string_type(type_name: &str) -> bool {
    let mut name = type_name;
    while let Some(rest) = name.strip_prefix('&') {
        name = rest.strip_prefix("mut ").unwrap_or(rest);
    }
    matches!(name, "str" | "alloc::string::String")
}

impl RouteArg {
    /// Capture an argument by serializing it.
    pub fn capture<T: Serialize + ?Sized>(arg: &T) -> Self {
        let type_name = std::any::type_name::<T>();
        let value = match serde_json::to_value(arg) {
            Ok(value) => ArgValue::Json(value),
            Err(e) => {
                tracing::debug!(type_name, error = %e, "Argument is not introspectable");
                ArgValue::Opaque
            }
        };
        Self {
            type_name,
            is_string: is_string_type(type_name),
            value,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn as_plain_str(&self) -> Option<&str> {
        match &self.value {
            ArgValue::Json(Value::String(s)) if self.is_string => Some(s),
            _ => None,
        }
    }

    /// Read `path` from this argument.
    ///
    /// `Ok(None)` means the field exists but holds `null`.
    pub fn field(&self, path: &str) -> Result<Option<String>, RouteError> {
        let unreadable = || RouteError::AttributeExtraction {
            type_name: self.type_name.to_string(),
            attribute: path.to_string(),
        };

        let mut current = match &self.value {
            ArgValue::Json(Value::Null) | ArgValue::Opaque => return Err(unreadable()),
            ArgValue::Json(value) => value,
        };

        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(unreadable)?,
                Value::Null => return Ok(None),
                _ => return Err(unreadable()),
            };
        }

        match current {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            Value::Array(_) | Value::Object(_) => Err(unreadable()),
        }
    }
}

/// Ordered arguments of an intercepted call.
#[derive(Debug, Clone, Default)]
pub struct RouteArgs {
    args: Vec<RouteArg>,
}

impl RouteArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, arg: &T) -> Self {
        self.args.push(RouteArg::capture(arg));
        self
    }

    pub fn push<T: Serialize + ?Sized>(&mut self, arg: &T) {
        self.args.push(RouteArg::capture(arg));
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteArg> {
        self.args.iter()
    }
}

impl From<&str> for RouteArgs {
    fn from(key: &str) -> Self {
        RouteArgs::new().arg(key)
    }
}

/// Pull the routing value for `attribute` out of `args`.
pub fn extract(attribute: &str, args: &RouteArgs) -> Result<String, RouteError> {
    // A lone string argument is the key itself.
    if let [only] = args.args.as_slice() {
        if let Some(key) = only.as_plain_str() {
            return Ok(key.to_string());
        }
    }

    for arg in args.iter() {
        if let Some(value) = arg.field(attribute)? {
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }
    }

    Err(RouteError::MissingRoutingValue {
        attribute: attribute.to_string(),
    })
}
