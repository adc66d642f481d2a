//! Types for the SQL crate.

use crate::sql::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ── Driver ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
}

impl Driver {
    /// Resolve a host-side driver name. Unknown names fall back to MySQL.
    pub fn from_name(name: &str) -> SqlResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "postgres" | "postgresql" | "pgx" => Ok(Self::Postgres),
            "oracle" | "godror" | "oci8" => Err(SqlError::UnsupportedDriver(name.to_string())),
            "mysql" => Ok(Self::MySql),
            other => {
                log::debug!("unknown driver '{other}', using mysql");
                Ok(Self::MySql)
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite3",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Bind placeholder for the `n`th parameter (1-based).
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::MySql | Self::Sqlite => "?".to_string(),
            Self::Postgres => format!("${n}"),
            Self::SqlServer => format!("@P{n}"),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Configuration ───────────────────────────────────────────────────

/// Pool shape, fixed when the connector is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    #[serde(default = "default_max_open")]
    pub max_open: u32,
    /// Seconds; 0 keeps connections for the life of the pool.
    #[serde(default)]
    pub max_lifetime_sec: u64,
    /// Seconds; 0 never reaps idle connections.
    #[serde(default)]
    pub idle_timeout_sec: u64,
}

fn default_max_open() -> u32 {
    5
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            max_lifetime_sec: 0,
            idle_timeout_sec: 0,
        }
    }
}

impl PoolSettings {
    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.max_lifetime_sec > 0).then(|| Duration::from_secs(self.max_lifetime_sec))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_sec > 0).then(|| Duration::from_secs(self.idle_timeout_sec))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Used by one-shot runs and by loads that pass no explicit settings.
    #[serde(default)]
    pub pool: PoolSettings,
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            connect_timeout_sec: default_connect_timeout(),
            pool: PoolSettings::default(),
        }
    }
}

impl SqlConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// What a run hands back to the host: a JSON document plus two flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlOutcome {
    pub json: String,
    pub is_error: bool,
    pub is_empty: bool,
}

impl SqlOutcome {
    pub fn data(json: String) -> Self {
        Self { json, is_error: false, is_empty: false }
    }

    /// A statement that ran but returns no rows by nature.
    pub fn status_ok() -> Self {
        Self {
            json: serde_json::json!({ "status": "OK" }).to_string(),
            is_error: false,
            is_empty: true,
        }
    }

    pub fn no_rows() -> Self {
        Self { json: "[]".to_string(), is_error: false, is_empty: true }
    }

    /// Log a failed run and wrap it.
    pub fn failed(err: SqlError) -> Self {
        log::warn!("SQL run failed: {err}");
        Self::error(&err)
    }

    pub fn error(err: &SqlError) -> Self {
        Self {
            json: serde_json::json!({ "error": err.to_string() }).to_string(),
            is_error: true,
            is_empty: false,
        }
    }
}

impl From<SqlResult<SqlOutcome>> for SqlOutcome {
    fn from(r: SqlResult<SqlOutcome>) -> Self {
        r.unwrap_or_else(SqlOutcome::failed)
    }
}

/// Aggregate result of a templated batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Generated id of the first record, where the backend reports one.
    pub last_insert_id: i64,
    pub rows_affected: u64,
    pub records_inserted: usize,
}
