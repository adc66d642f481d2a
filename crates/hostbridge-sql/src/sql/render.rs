//! Row sets → the outcome JSON.

use crate::sql::error::{SqlError, SqlResult};
use crate::sql::types::SqlOutcome;
use serde_json::{Map, Value};

/// Statements that never return rows. An empty result from one of these
/// is reported as `{"status":"OK"}` rather than `[]`.
const NON_RETURNING: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "DROP", "CREATE", "ALTER", "TRUNCATE", "CALL",
];

/// Column whose text stands in for the whole row.
const JSON_COLUMN: &str = "JSON";

/// One decoded result set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }
}

pub fn is_non_returning(query: &str) -> bool {
    let verb = query.split_whitespace().next().unwrap_or_default();
    NON_RETURNING.iter().any(|v| verb.eq_ignore_ascii_case(v))
}

/// Serialise a row set into the outcome envelope.
pub fn to_outcome(query: &str, set: RowSet) -> SqlResult<SqlOutcome> {
    if set.rows.is_empty() {
        return Ok(if is_non_returning(query) {
            SqlOutcome::status_ok()
        } else {
            SqlOutcome::no_rows()
        });
    }

    // A JSON column replaces the whole row with its own parsed value.
    let json_index = set.columns.iter().position(|c| c.eq_ignore_ascii_case(JSON_COLUMN));

    let mut out = Vec::with_capacity(set.rows.len());
    for row in set.rows {
        if let Some(idx) = json_index {
            out.push(splice_json(row.into_iter().nth(idx).unwrap_or(Value::Null))?);
            continue;
        }
        let mut obj = Map::with_capacity(set.columns.len());
        for (name, value) in set.columns.iter().zip(row) {
            obj.insert(name.clone(), value);
        }
        out.push(Value::Object(obj));
    }
    Ok(SqlOutcome::data(serde_json::to_string(&out)?))
}

fn splice_json(value: Value) -> SqlResult<Value> {
    match value {
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|e| SqlError::InvalidJsonColumn(e.to_string()))
        }
        other => Ok(other),
    }
}
