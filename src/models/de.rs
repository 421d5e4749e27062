//! Lenient field deserializers for hand-edited template files.
//!
//! Template files in the wild carry numbers where strings are expected
//! (`version: 1.0`), `null` where a list is expected (`tags:` with no
//! items) and block scalars where a line list is expected. These helpers
//! accept those variants instead of rejecting the whole file.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Render a scalar JSON value as plain text.
/// Whole floats keep one decimal so `1.0` stays `"1.0"`.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        return format!("{:.1}", f);
                    }
                }
            }
            n.to_string()
        }
        other => other.to_string(),
    }
}

/// String field that tolerates numbers, booleans and null
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(scalar_text).unwrap_or_default())
}

/// Optional string field that tolerates numbers and booleans; null stays None
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(scalar_text(&v)),
    })
}

/// Any defaultable field where an explicit null means "use the default"
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Configuration body: a list of lines, or a single block of text split on newlines
pub fn config_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
        Some(Value::String(text)) => split_lines(&text),
        Some(other) => vec![scalar_text(&other)],
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// List field that also accepts a single item; null stays None
pub fn opt_one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::Many(items)) => Some(items),
        Some(OneOrMany::One(item)) => Some(vec![item]),
    })
}

/// List field that also accepts a single item; null is empty
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(opt_one_or_many(deserializer)?.unwrap_or_default())
}

/// List of objects; entries that are not objects are dropped, and anything
/// other than a list reads as empty
pub fn object_entries<'de, D>(deserializer: D) -> Result<Vec<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Split a configuration body on `\n`, keeping empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}
