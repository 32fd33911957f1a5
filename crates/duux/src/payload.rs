//! Helpers for reading the loosely-typed JSON the Duux cloud hands back.
//!
//! Field names drift between firmware generations (`setting_name`,
//! `settingName`, `name`, ...) and values arrive as strings, numbers or
//! booleans depending on the model, so every lookup goes through these
//! helpers rather than a fixed serde schema.

use serde_json::Map;
use serde_json::Value;

/// Whether a value counts as "set".
///
/// Null, `false`, zero, and empty strings, arrays and objects are unset.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Look up a field that may be spelled several ways.
///
/// Returns the first alias holding a set value. When none of them is set the
/// last alias is returned as-is, so a literal `0` or `""` under the final
/// spelling still comes through. Null is treated as missing.
pub fn first_alias<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| map.get(*alias))
        .find(|value| is_truthy(value))
        .or_else(|| aliases.last().and_then(|alias| map.get(*alias)))
        .filter(|value| !value.is_null())
}

/// Render a scalar the way it is sent to the device: strings verbatim,
/// booleans capitalised (`True`/`False`, as the cloud echoes them), everything
/// else as its JSON text.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

/// Read a number that may also arrive as a numeric string.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON number holding a whole value, so `49` and `49.0` agree.
/// Strings are not numbers here.
pub fn whole_number(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Read an integer that may also arrive as a numeric string.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => whole_number(value),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Depth-first search for every value stored under `key`.
///
/// Objects are visited in insertion order and arrays in index order. A match
/// on an object is yielded before anything nested inside that object,
/// including the matched value itself.
pub fn deep_find<'a>(root: &'a Value, key: &'a str) -> DeepFind<'a> {
    DeepFind {
        key,
        stack: vec![root],
    }
}

pub struct DeepFind<'a> {
    key: &'a str,
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for DeepFind<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Value::Object(map) => {
                    self.stack.extend(map.values().rev());
                    if let Some(found) = map.get(self.key) {
                        return Some(found);
                    }
                }
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                _ => {}
            }
        }
        None
    }
}
