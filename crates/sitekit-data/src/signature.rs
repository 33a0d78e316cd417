//! Selector-call signatures

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Stable key for a `(name, arguments)` pair.
///
/// Arguments are serialized to JSON with object keys sorted recursively, so
/// structurally equal arguments always produce the same signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    name: String,
    args: String,
}

impl Signature {
    pub fn new<A: Serialize + ?Sized>(name: &str, args: &A) -> Self {
        Self {
            name: name.to_string(),
            args: canonical_json(args),
        }
    }

    /// Selector or action name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical JSON of the arguments
    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn is_for(&self, name: &str) -> bool {
        self.name == name
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args)
    }
}

/// Serialize `value` to JSON with sorted object keys
pub fn canonical_json<A: Serialize + ?Sized>(value: &A) -> String {
    let value = match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Arguments are not serializable, using null");
            Value::Null
        }
    };
    let mut out = String::new();
    write_canonical(&value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
