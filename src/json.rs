//! JSON document helpers for hosts without a JSON library of their own.
//!
//! Every function takes documents as text and returns text, so each call
//! parses its input afresh. Output is compact and keeps object keys in
//! document order.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("index {index} out of range for an array of {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("path segment '{0}' cannot be followed")]
    PathNotFound(String),

    #[error("{0} cannot be represented in JSON")]
    InvalidNumber(f64),

    #[error("schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },
}

impl JsonError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => -120,
            Self::NotAnObject => -121,
            Self::NotAnArray => -122,
            Self::KeyNotFound(_) => -123,
            Self::IndexOutOfRange { .. } => -124,
            Self::PathNotFound(_) => -125,
            Self::InvalidNumber(_) => -126,
            Self::SchemaMismatch { .. } => -127,
        }
    }

    fn mismatch(path: &str, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch { path: path.to_string(), reason: reason.into() }
    }
}

pub type JsonResult<T> = Result<T, JsonError>;

fn parse(json: &str) -> JsonResult<Value> {
    Ok(serde_json::from_str(json)?)
}

fn parse_object(json: &str) -> JsonResult<Map<String, Value>> {
    match parse(json)? {
        Value::Object(map) => Ok(map),
        _ => Err(JsonError::NotAnObject),
    }
}

fn parse_array(json: &str) -> JsonResult<Vec<Value>> {
    match parse(json)? {
        Value::Array(items) => Ok(items),
        _ => Err(JsonError::NotAnArray),
    }
}

fn index_in(index: i64, len: usize) -> JsonResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(JsonError::IndexOutOfRange { index, len })
}

/// Strings unquoted, numbers and booleans as literals, `null` as `null`,
/// containers as compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Reading ─────────────────────────────────────────────────────────

/// Re-encode a document compactly.
pub fn normalize(json: &str) -> JsonResult<String> {
    Ok(parse(json)?.to_string())
}

pub fn is_valid(json: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(json).is_ok()
}

/// Top-level member of an object, rendered as scalar text.
pub fn get_value(json: &str, key: &str) -> JsonResult<String> {
    let map = parse_object(json)?;
    map.get(key).map(scalar_text).ok_or_else(|| JsonError::KeyNotFound(key.to_string()))
}

/// Follow a dot-separated path; numeric segments index arrays. Empty
/// segments are ignored, so `""` addresses the whole document.
pub fn get_value_by_path(json: &str, path: &str) -> JsonResult<String> {
    let root = parse(json)?;
    let mut current = &root;
    for part in path.split('.').filter(|p| !p.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(part).ok_or_else(|| JsonError::PathNotFound(part.to_string()))?,
            Value::Array(items) => part
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| JsonError::PathNotFound(part.to_string()))?,
            _ => return Err(JsonError::PathNotFound(part.to_string())),
        };
    }
    Ok(scalar_text(current))
}

pub fn keys(json: &str) -> JsonResult<Vec<String>> {
    Ok(parse_object(json)?.into_iter().map(|(k, _)| k).collect())
}

pub fn array_length(json: &str) -> JsonResult<usize> {
    Ok(parse_array(json)?.len())
}

/// One element as JSON text (strings stay quoted).
pub fn array_item(json: &str, index: i64) -> JsonResult<String> {
    let items = parse_array(json)?;
    let i = index_in(index, items.len())?;
    Ok(items[i].to_string())
}

/// Every element as JSON text.
pub fn array_items(json: &str) -> JsonResult<Vec<String>> {
    Ok(parse_array(json)?.iter().map(Value::to_string).collect())
}

// ── Editing ─────────────────────────────────────────────────────────

fn set_member(json: &str, key: &str, value: Value) -> JsonResult<String> {
    let mut map = parse_object(json)?;
    map.insert(key.to_string(), value);
    Ok(Value::Object(map).to_string())
}

pub fn add_string(json: &str, key: &str, value: &str) -> JsonResult<String> {
    set_member(json, key, Value::String(value.to_string()))
}

/// Whole numbers are stored as integers, so `3.0` is written `3`.
pub fn add_number(json: &str, key: &str, value: f64) -> JsonResult<String> {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    let number = if value.fract() == 0.0 && value.abs() < EXACT {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).ok_or(JsonError::InvalidNumber(value))?
    };
    set_member(json, key, Value::Number(number))
}

pub fn add_bool(json: &str, key: &str, value: bool) -> JsonResult<String> {
    set_member(json, key, Value::Bool(value))
}

/// Nest the document `child` under `key`.
pub fn add_json(parent: &str, key: &str, child: &str) -> JsonResult<String> {
    let child = parse(child)?;
    set_member(parent, key, child)
}

/// Append the document `item` to an array.
pub fn add_item(array: &str, item: &str) -> JsonResult<String> {
    let mut items = parse_array(array)?;
    items.push(parse(item)?);
    Ok(Value::Array(items).to_string())
}

pub fn remove_key(json: &str, key: &str) -> JsonResult<String> {
    let mut map = parse_object(json)?;
    if map.shift_remove(key).is_none() {
        return Err(JsonError::KeyNotFound(key.to_string()));
    }
    Ok(Value::Object(map).to_string())
}

pub fn remove_item(array: &str, index: i64) -> JsonResult<String> {
    let mut items = parse_array(array)?;
    let i = index_in(index, items.len())?;
    items.remove(i);
    Ok(Value::Array(items).to_string())
}

/// Shallow merge of two objects; members of `overlay` win.
pub fn merge(base: &str, overlay: &str) -> JsonResult<String> {
    let mut map = parse_object(base)?;
    map.extend(parse_object(overlay)?);
    Ok(Value::Object(map).to_string())
}

// ── Structural validation ───────────────────────────────────────────

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check `json` against an example-shaped `schema`: objects must carry
/// exactly the schema's keys, an array schema's first element describes
/// every item (an empty one accepts any items), and other values must
/// share the schema value's type.
pub fn validate(json: &str, schema: &str) -> JsonResult<()> {
    let data = parse(json)?;
    let schema = parse(schema)?;
    check(&data, &schema, "$")
}

fn check(data: &Value, schema: &Value, path: &str) -> JsonResult<()> {
    match schema {
        Value::Object(expected) => {
            let Value::Object(actual) = data else {
                return Err(JsonError::mismatch(path, format!("expected an object, found {}", kind(data))));
            };
            if let Some(missing) = expected.keys().find(|k| !actual.contains_key(*k)) {
                return Err(JsonError::mismatch(path, format!("missing key '{missing}'")));
            }
            if let Some(extra) = actual.keys().find(|k| !expected.contains_key(*k)) {
                return Err(JsonError::mismatch(path, format!("unexpected key '{extra}'")));
            }
            for (key, sub) in expected {
                check(&actual[key], sub, &format!("{path}.{key}"))?;
            }
            Ok(())
        }
        Value::Array(expected) => {
            let Value::Array(actual) = data else {
                return Err(JsonError::mismatch(path, format!("expected an array, found {}", kind(data))));
            };
            if let Some(item_schema) = expected.first() {
                for (i, item) in actual.iter().enumerate() {
                    check(item, item_schema, &format!("{path}[{i}]"))?;
                }
            }
            Ok(())
        }
        _ if kind(data) == kind(schema) => Ok(()),
        _ => Err(JsonError::mismatch(path, format!("expected {}, found {}", kind(schema), kind(data)))),
    }
}
