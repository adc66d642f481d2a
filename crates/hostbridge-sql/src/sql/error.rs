//! Error type for the SQL crate.
//!
//! Every variant ends up as `{"error": "<Display>"}` in the outcome envelope.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    /// A tagged argument (`int::x`, `blob::...`) that does not decode.
    #[error("invalid parameter '{value}': {reason}")]
    InvalidParameter { value: String, reason: String },

    #[error("unsupported template: {0}")]
    UnsupportedTemplate(String),

    #[error("the query expects a valid JSON payload: {0}")]
    InvalidPayload(String),

    #[error("the JSON payload array is empty")]
    EmptyPayload,

    #[error("record {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("record {row}: BLOB field '{field}' {reason}")]
    InvalidBlob { row: usize, field: String, reason: String },

    /// One record of a batch failed; nothing from the batch was kept.
    #[error("record {row} failed, batch rolled back: {message}")]
    BatchFailed { row: usize, message: String },

    #[error("column JSON does not hold valid JSON: {0}")]
    InvalidJsonColumn(String),

    #[error("unknown connector handle {0}")]
    UnknownHandle(u64),
}

pub type SqlResult<T> = Result<T, SqlError>;

impl From<sqlx::Error> for SqlError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Configuration(inner) => Self::InvalidDsn(inner.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Connection(e.to_string())
            }
            _ => Self::Query(e.to_string()),
        }
    }
}

impl From<tiberius::error::Error> for SqlError {
    fn from(e: tiberius::error::Error) -> Self {
        match &e {
            tiberius::error::Error::Io { .. } | tiberius::error::Error::Tls(_) | tiberius::error::Error::Routing { .. } => {
                Self::Connection(e.to_string())
            }
            _ => Self::Query(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(e: serde_json::Error) -> Self {
        Self::Query(format!("JSON encoding: {e}"))
    }
}
