//! The `JSON[...]` statement templates.
//!
//! Four shapes are recognised (case-insensitive, trailing `;` ignored):
//!
//! ```text
//! CALL proc(JSON[a,b,BLOB(c)])
//! INSERT INTO t(a,b,c) VALUES(JSON[a,b,BLOB(c)])
//! INSERT INTO t VALUES(JSON[a,b,c])
//! SELECT fn(JSON[a,b])
//! ```
//!
//! A template compiles once into a parameterised statement. The JSON
//! payload (one object or an array of objects) is then turned into one
//! parameter row per record, with `BLOB(x)` fields base64-decoded. All of
//! that happens before anything touches the database.

use crate::sql::error::{SqlError, SqlResult};
use crate::sql::params::SqlParam;
use crate::sql::types::Driver;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref TEMPLATED: Regex =
        Regex::new(r"(?i)\(JSON\[([a-z0-9_,BLOB()\s]+)\]").expect("template detection regex");
    static ref CALL: Regex =
        Regex::new(r"(?i)^call\s+([a-z0-9_.]+)\s*\(JSON\[([a-z0-9_,BLOB()\s]+)\]\)$").expect("call regex");
    static ref INSERT_COLUMNS: Regex = Regex::new(
        r"(?i)^insert\s+into\s+([a-z0-9_.]+)\s*\(([a-z0-9_,\sBLOB()]+)\)\s*values\s*\(JSON\[([a-z0-9_,BLOB()\s]+)\]\)$"
    )
    .expect("insert-with-columns regex");
    static ref INSERT_VALUES: Regex = Regex::new(
        r"(?i)^insert\s+into\s+([a-z0-9_.]+)\s*values\s*\(JSON\[([a-z0-9_,BLOB()\s]+)\]\)$"
    )
    .expect("insert regex");
    static ref SELECT_FN: Regex =
        Regex::new(r"(?i)^select\s+([a-z0-9_.]+)\s*\(JSON\[([a-z0-9_,BLOB()\s]+)\]\)$").expect("select regex");
    static ref BLOB_FIELD: Regex = Regex::new(r"(?i)^BLOB\(\s*([a-z0-9_]+)\s*\)$").expect("blob regex");
    static ref PLAIN_FIELD: Regex = Regex::new(r"(?i)^[a-z0-9_]+$").expect("field regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Call { procedure: String },
    InsertColumns { table: String, columns: Vec<String> },
    InsertValues { table: String },
    Select { function: String },
}

/// One name inside `JSON[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub blob: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub shape: Shape,
    pub fields: Vec<Field>,
}

impl Template {
    /// Whether `query` uses the `(JSON[...]` placeholder at all.
    pub fn is_templated(query: &str) -> bool {
        TEMPLATED.is_match(query)
    }

    pub fn parse(query: &str) -> SqlResult<Self> {
        let normalized = query.trim().trim_end_matches(';').trim();
        let unsupported = || SqlError::UnsupportedTemplate(normalized.to_string());

        let (shape, field_list) = if let Some(c) = CALL.captures(normalized) {
            (Shape::Call { procedure: c[1].to_string() }, c[2].to_string())
        } else if let Some(c) = INSERT_COLUMNS.captures(normalized) {
            let columns = split_list(&c[2])
                .into_iter()
                .map(|col| match BLOB_FIELD.captures(&col) {
                    Some(b) => b[1].to_string(),
                    None => col,
                })
                .collect::<Vec<_>>();
            if columns.iter().any(|c| !PLAIN_FIELD.is_match(c)) {
                return Err(unsupported());
            }
            (Shape::InsertColumns { table: c[1].to_string(), columns }, c[3].to_string())
        } else if let Some(c) = INSERT_VALUES.captures(normalized) {
            (Shape::InsertValues { table: c[1].to_string() }, c[2].to_string())
        } else if let Some(c) = SELECT_FN.captures(normalized) {
            (Shape::Select { function: c[1].to_string() }, c[2].to_string())
        } else {
            return Err(unsupported());
        };

        let fields = split_list(&field_list)
            .into_iter()
            .map(|item| {
                if let Some(b) = BLOB_FIELD.captures(&item) {
                    Ok(Field { name: b[1].to_string(), blob: true })
                } else if PLAIN_FIELD.is_match(&item) {
                    Ok(Field { name: item, blob: false })
                } else {
                    Err(unsupported())
                }
            })
            .collect::<SqlResult<Vec<_>>>()?;

        if let Shape::InsertColumns { columns, .. } = &shape {
            if columns.len() != fields.len() {
                return Err(SqlError::UnsupportedTemplate(format!(
                    "{} columns but {} JSON fields in: {}",
                    columns.len(),
                    fields.len(),
                    normalized
                )));
            }
        }

        Ok(Self { shape, fields })
    }

    /// The parameterised statement in `driver`'s placeholder dialect.
    pub fn render(&self, driver: Driver) -> String {
        let marks = (1..=self.fields.len())
            .map(|n| driver.placeholder(n))
            .collect::<Vec<_>>()
            .join(",");
        match &self.shape {
            Shape::Call { procedure } if driver == Driver::SqlServer => format!("EXEC {procedure} {marks}"),
            Shape::Call { procedure } => format!("CALL {procedure}({marks})"),
            Shape::InsertColumns { table, columns } => {
                format!("INSERT INTO {table}({}) VALUES({marks})", columns.join(","))
            }
            Shape::InsertValues { table } => format!("INSERT INTO {table} VALUES({marks})"),
            Shape::Select { function } => format!("SELECT {function}({marks})"),
        }
    }

    /// Turn the payload into one parameter row per record.
    ///
    /// Plain fields must be present in every record. BLOB fields may be
    /// absent or `null` (bound as NULL); otherwise they must be base64 text.
    pub fn bind_payload(&self, payload: &Value) -> SqlResult<Vec<Vec<SqlParam>>> {
        let records: Vec<&Map<String, Value>> = match payload {
            Value::Object(obj) => vec![obj],
            Value::Array(items) if items.is_empty() => return Err(SqlError::EmptyPayload),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().ok_or_else(|| {
                        SqlError::InvalidPayload(format!("record {} is not a JSON object", i + 1))
                    })
                })
                .collect::<SqlResult<_>>()?,
            _ => {
                return Err(SqlError::InvalidPayload(
                    "expected a JSON object or an array of objects".to_string(),
                ))
            }
        };

        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.bind_record(i + 1, record))
            .collect()
    }

    fn bind_record(&self, row: usize, record: &Map<String, Value>) -> SqlResult<Vec<SqlParam>> {
        self.fields
            .iter()
            .map(|field| {
                let value = record.get(&field.name).ok_or_else(|| SqlError::MissingField {
                    row,
                    field: field.name.clone(),
                })?;
                if !field.blob {
                    return Ok(SqlParam::from_json(value));
                }
                // A present null is the only way to bind a NULL blob.
                match value {
                    Value::Null => Ok(SqlParam::Null),
                    Value::String(encoded) => STANDARD
                        .decode(encoded)
                        .map(SqlParam::Blob)
                        .map_err(|e| SqlError::InvalidBlob {
                            row,
                            field: field.name.clone(),
                            reason: format!("is not valid base64: {e}"),
                        }),
                    _ => Err(SqlError::InvalidBlob {
                        row,
                        field: field.name.clone(),
                        reason: "must be a base64 string or null".to_string(),
                    }),
                }
            })
            .collect()
    }
}

/// Split a comma list, trimming each item.
fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_templates() {
        assert!(Template::is_templated("INSERT INTO t(a) VALUES(JSON[a])"));
        assert!(Template::is_templated("call p(json[a, BLOB(b)])"));
        assert!(!Template::is_templated("SELECT * FROM t WHERE a = ?"));
    }

    #[test]
    fn parses_insert_with_columns() {
        let t = Template::parse("insert into docs(id, body, BLOB(data)) values (JSON[id,body,BLOB(data)]);").unwrap();
        assert_eq!(
            t.shape,
            Shape::InsertColumns {
                table: "docs".into(),
                columns: vec!["id".into(), "body".into(), "data".into()]
            }
        );
        assert_eq!(t.fields.len(), 3);
        assert!(t.fields[2].blob);
        assert_eq!(t.render(Driver::MySql), "INSERT INTO docs(id,body,data) VALUES(?,?,?)");
        assert_eq!(t.render(Driver::Postgres), "INSERT INTO docs(id,body,data) VALUES($1,$2,$3)");
    }

    #[test]
    fn parses_other_shapes() {
        let t = Template::parse("CALL add_user(JSON[name,age])").unwrap();
        assert_eq!(t.render(Driver::MySql), "CALL add_user(?,?)");
        assert_eq!(t.render(Driver::SqlServer), "EXEC add_user @P1,@P2");

        let t = Template::parse("INSERT INTO log VALUES(JSON[ts,msg])").unwrap();
        assert_eq!(t.render(Driver::Sqlite), "INSERT INTO log VALUES(?,?)");

        let t = Template::parse("SELECT next_id(JSON[kind])").unwrap();
        assert_eq!(t.render(Driver::Postgres), "SELECT next_id($1)");
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(matches!(
            Template::parse("UPDATE t SET a = 1 WHERE (JSON[a])"),
            Err(SqlError::UnsupportedTemplate(_))
        ));
        assert!(Template::parse("INSERT INTO t(a,b) VALUES(JSON[a])").is_err());
        assert!(Template::parse("INSERT INTO t(a) VALUES(JSON[a,])").is_err());
    }

    #[test]
    fn binds_batch_payload() {
        let t = Template::parse("INSERT INTO t(a) VALUES(JSON[a])").unwrap();
        let rows = t.bind_payload(&json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(rows, vec![vec![SqlParam::Int(1)], vec![SqlParam::Int(2)]]);

        let rows = t.bind_payload(&json!({"a": "x"})).unwrap();
        assert_eq!(rows, vec![vec![SqlParam::Text("x".into())]]);
    }

    #[test]
    fn payload_errors() {
        let t = Template::parse("INSERT INTO t(a) VALUES(JSON[a])").unwrap();
        assert!(matches!(t.bind_payload(&json!([])), Err(SqlError::EmptyPayload)));
        assert!(matches!(
            t.bind_payload(&json!([{"a": 1}, {"b": 2}])),
            Err(SqlError::MissingField { row: 2, .. })
        ));
        assert!(matches!(t.bind_payload(&json!(5)), Err(SqlError::InvalidPayload(_))));
    }

    #[test]
    fn blob_fields() {
        let t = Template::parse("INSERT INTO f(name, data) VALUES(JSON[name, BLOB(data)])").unwrap();
        let rows = t
            .bind_payload(&json!([{"name": "a", "data": "aGk="}, {"name": "b", "data": null}]))
            .unwrap();
        assert_eq!(rows[0][1], SqlParam::Blob(b"hi".to_vec()));
        assert_eq!(rows[1][1], SqlParam::Null);

        assert!(matches!(
            t.bind_payload(&json!({"name": "a", "data": "not base64!"})),
            Err(SqlError::InvalidBlob { row: 1, .. })
        ));
        assert!(matches!(
            t.bind_payload(&json!({"name": "a", "data": 12})),
            Err(SqlError::InvalidBlob { .. })
        ));
    }

    #[test]
    fn absent_blob_field_is_missing() {
        let t = Template::parse("INSERT INTO f(name, data) VALUES(JSON[name, BLOB(data)])").unwrap();
        match t.bind_payload(&json!({"name": "a"})) {
            Err(SqlError::MissingField { row, field }) => {
                assert_eq!(row, 1);
                assert_eq!(field, "data");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
        assert!(matches!(
            t.bind_payload(&json!([{"name": "a", "data": null}, {"name": "c"}])),
            Err(SqlError::MissingField { row: 2, .. })
        ));
    }
}
