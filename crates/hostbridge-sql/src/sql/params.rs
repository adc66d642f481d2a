//! Bind parameters.
//!
//! The host passes arguments as strings with an optional type tag
//! (`int::42`, `blob::<base64>`, ...). They are decoded once here, at the
//! edge, and the rest of the crate only sees [`SqlParam`].

use crate::sql::error::{SqlError, SqlResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlParam {
    /// Decode one tagged argument. Untagged strings are text.
    pub fn from_tagged(arg: &str) -> SqlResult<Self> {
        let invalid = |reason: String| SqlError::InvalidParameter {
            value: arg.to_string(),
            reason,
        };

        if let Some(v) = arg.strip_prefix("int::") {
            return v.trim().parse::<i64>().map(Self::Int).map_err(|e| invalid(e.to_string()));
        }
        if let Some(v) = arg.strip_prefix("float::").or_else(|| arg.strip_prefix("double::")) {
            return v.trim().parse::<f64>().map(Self::Float).map_err(|e| invalid(e.to_string()));
        }
        if let Some(v) = arg.strip_prefix("bool::") {
            return parse_bool(v.trim())
                .map(Self::Bool)
                .ok_or_else(|| invalid("expected true/false, t/f or 1/0".to_string()));
        }
        if arg.starts_with("null::") {
            return Ok(Self::Null);
        }
        if let Some(v) = arg.strip_prefix("blob::") {
            return STANDARD
                .decode(v.trim())
                .map(Self::Blob)
                .map_err(|e| invalid(format!("invalid base64: {e}")));
        }
        Ok(Self::Text(arg.to_string()))
    }

    pub fn from_tagged_all<S: AsRef<str>>(args: &[S]) -> SqlResult<Vec<Self>> {
        args.iter().map(|a| Self::from_tagged(a.as_ref())).collect()
    }

    /// Bind value for a JSON payload field.
    ///
    /// Arrays and objects bind as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// The spellings accepted for `bool::`.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_arguments() {
        assert_eq!(SqlParam::from_tagged("int::42").unwrap(), SqlParam::Int(42));
        assert_eq!(SqlParam::from_tagged("double::2.5").unwrap(), SqlParam::Float(2.5));
        assert_eq!(SqlParam::from_tagged("float::1").unwrap(), SqlParam::Float(1.0));
        assert_eq!(SqlParam::from_tagged("bool::t").unwrap(), SqlParam::Bool(true));
        assert_eq!(SqlParam::from_tagged("null::").unwrap(), SqlParam::Null);
        assert_eq!(SqlParam::from_tagged("blob::aGk=").unwrap(), SqlParam::Blob(b"hi".to_vec()));
        assert_eq!(SqlParam::from_tagged("plain").unwrap(), SqlParam::Text("plain".into()));
    }

    #[test]
    fn bad_tagged_arguments() {
        assert!(matches!(
            SqlParam::from_tagged("int::x"),
            Err(SqlError::InvalidParameter { .. })
        ));
        assert!(SqlParam::from_tagged("bool::yes").is_err());
        assert!(SqlParam::from_tagged("blob::***").is_err());
    }

    #[test]
    fn json_values() {
        assert_eq!(SqlParam::from_json(&json!(7)), SqlParam::Int(7));
        assert_eq!(SqlParam::from_json(&json!(7.5)), SqlParam::Float(7.5));
        assert_eq!(SqlParam::from_json(&json!(null)), SqlParam::Null);
        assert_eq!(SqlParam::from_json(&json!({"a": 1})), SqlParam::Text(r#"{"a":1}"#.into()));
    }
}
