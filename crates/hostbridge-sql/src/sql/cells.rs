//! Column values → JSON.
//!
//! Each backend reports its own type names; the value is decoded with the
//! matching Rust type and turned into the closest JSON form. Binary data
//! becomes base64, exact numerics and temporal values become strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Row, TypeInfo, ValueRef};
use tiberius::{ColumnData, FromSql};

/// Try each type in turn; the first that decodes to a non-null value wins.
macro_rules! first_decoded {
    ($row:expr, $i:expr; $($ty:ty => $to_json:expr),+ $(,)?) => {{
        let mut out = None;
        $(
            if out.is_none() {
                if let Ok(Some(v)) = $row.try_get::<Option<$ty>, _>($i) {
                    out = Some(($to_json)(v));
                }
            }
        )+
        out
    }};
}

fn bytes_json(bytes: Vec<u8>) -> Value {
    Value::String(STANDARD.encode(bytes))
}

fn text_json(s: String) -> Value {
    Value::String(s)
}

fn float_json(f: f64) -> Value {
    // NaN and infinities have no JSON form
    serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn undecoded(backend: &str, type_name: &str) -> Value {
    log::debug!("{backend}: no JSON mapping for column type {type_name}, emitting null");
    Value::Null
}

// ── MySQL ───────────────────────────────────────────────────────────

pub fn mysql_cell(row: &MySqlRow, i: usize) -> Value {
    let type_name = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    let decoded = match type_name.as_str() {
        "BOOLEAN" => first_decoded!(row, i; bool => Value::Bool),
        "FLOAT" => first_decoded!(row, i; f32 => |v: f32| float_json(v as f64)),
        "DOUBLE" => first_decoded!(row, i; f64 => float_json),
        "DECIMAL" => first_decoded!(row, i; Decimal => |d: Decimal| text_json(d.to_string())),
        "DATE" => first_decoded!(row, i; NaiveDate => |d: NaiveDate| text_json(d.to_string())),
        "TIME" => first_decoded!(row, i; NaiveTime => |t: NaiveTime| text_json(t.to_string())),
        "DATETIME" => first_decoded!(row, i; NaiveDateTime => |t: NaiveDateTime| text_json(t.to_string())),
        "TIMESTAMP" => first_decoded!(row, i; DateTime<Utc> => |t: DateTime<Utc>| text_json(t.to_rfc3339())),
        "JSON" => first_decoded!(row, i; Value => |v| v),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" | "GEOMETRY" => {
            first_decoded!(row, i; Vec<u8> => bytes_json)
        }
        t if t.contains("INT") || t == "YEAR" => first_decoded!(row, i;
            i64 => |v: i64| json!(v),
            u64 => |v: u64| json!(v),
        ),
        _ => first_decoded!(row, i;
            String => text_json,
            Vec<u8> => bytes_json,
        ),
    };
    decoded.unwrap_or_else(|| undecoded("mysql", &type_name))
}

// ── PostgreSQL ──────────────────────────────────────────────────────

pub fn pg_cell(row: &PgRow, i: usize) -> Value {
    let type_name = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    let decoded = match type_name.as_str() {
        "BOOL" => first_decoded!(row, i; bool => Value::Bool),
        "INT2" => first_decoded!(row, i; i16 => |v: i16| json!(v)),
        "INT4" => first_decoded!(row, i; i32 => |v: i32| json!(v)),
        "INT8" => first_decoded!(row, i; i64 => |v: i64| json!(v)),
        "OID" => first_decoded!(row, i; sqlx::postgres::types::Oid => |v: sqlx::postgres::types::Oid| json!(v.0)),
        "FLOAT4" => first_decoded!(row, i; f32 => |v: f32| float_json(v as f64)),
        "FLOAT8" => first_decoded!(row, i; f64 => float_json),
        "NUMERIC" => first_decoded!(row, i; Decimal => |d: Decimal| text_json(d.to_string())),
        "DATE" => first_decoded!(row, i; NaiveDate => |d: NaiveDate| text_json(d.to_string())),
        "TIME" => first_decoded!(row, i; NaiveTime => |t: NaiveTime| text_json(t.to_string())),
        "TIMESTAMP" => first_decoded!(row, i; NaiveDateTime => |t: NaiveDateTime| text_json(t.to_string())),
        "TIMESTAMPTZ" => first_decoded!(row, i; DateTime<Utc> => |t: DateTime<Utc>| text_json(t.to_rfc3339())),
        "UUID" => first_decoded!(row, i; Uuid => |u: Uuid| text_json(u.to_string())),
        "JSON" | "JSONB" => first_decoded!(row, i; Value => |v| v),
        "BYTEA" => first_decoded!(row, i; Vec<u8> => bytes_json),
        _ => first_decoded!(row, i; String => text_json),
    };
    decoded.unwrap_or_else(|| undecoded("postgres", &type_name))
}

// ── SQLite ──────────────────────────────────────────────────────────

/// SQLite decodes by the value's storage class, not the declared type.
pub fn sqlite_cell(row: &SqliteRow, i: usize) -> Value {
    let type_name = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => first_decoded!(row, i; i64 => |v: i64| json!(v)),
        "REAL" => first_decoded!(row, i; f64 => float_json),
        "BLOB" => first_decoded!(row, i; Vec<u8> => bytes_json),
        _ => first_decoded!(row, i;
            String => text_json,
            Vec<u8> => bytes_json,
        ),
    };
    decoded.unwrap_or_else(|| undecoded("sqlite", &type_name))
}

// ── SQL Server ──────────────────────────────────────────────────────

pub fn mssql_cell(col: &ColumnData<'static>) -> Value {
    match col {
        ColumnData::Bit(Some(v)) => Value::Bool(*v),
        ColumnData::U8(Some(v)) => json!(*v),
        ColumnData::I16(Some(v)) => json!(*v),
        ColumnData::I32(Some(v)) => json!(*v),
        ColumnData::I64(Some(v)) => json!(*v),
        ColumnData::F32(Some(v)) => float_json(*v as f64),
        ColumnData::F64(Some(v)) => float_json(*v),
        ColumnData::String(Some(v)) => Value::String(v.to_string()),
        ColumnData::Guid(Some(v)) => Value::String(v.to_string()),
        ColumnData::Numeric(Some(v)) => Value::String(v.to_string()),
        ColumnData::Binary(Some(v)) => bytes_json(v.to_vec()),
        ColumnData::Xml(Some(v)) => Value::String(v.clone().into_owned().into_string()),
        ColumnData::Date(Some(_)) => temporal::<NaiveDate>(col),
        ColumnData::Time(Some(_)) => temporal::<NaiveTime>(col),
        ColumnData::DateTime(Some(_)) | ColumnData::SmallDateTime(Some(_)) | ColumnData::DateTime2(Some(_)) => {
            temporal::<NaiveDateTime>(col)
        }
        ColumnData::DateTimeOffset(Some(_)) => match DateTime::<Utc>::from_sql(col) {
            Ok(Some(t)) => Value::String(t.to_rfc3339()),
            _ => undecoded("sqlserver", "datetimeoffset"),
        },
        _ => Value::Null,
    }
}

fn temporal<'a, T>(col: &'a ColumnData<'static>) -> Value
where
    T: FromSql<'a> + ToString,
{
    match T::from_sql(col) {
        Ok(Some(t)) => Value::String(t.to_string()),
        _ => undecoded("sqlserver", "temporal"),
    }
}
