//! One open database: a sqlx pool, or a tiberius client for SQL Server.

use crate::sql::cells;
use crate::sql::dsn;
use crate::sql::error::{SqlError, SqlResult};
use crate::sql::params::SqlParam;
use crate::sql::render::{self, RowSet};
use crate::sql::template::Template;
use crate::sql::types::{BatchSummary, Driver, PoolSettings, SqlOutcome};
use log::{debug, info, warn};
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlQueryResult};
use sqlx::pool::PoolOptions;
use sqlx::postgres::PgPool;
use sqlx::sqlite::{SqlitePool, SqliteQueryResult};
use sqlx::{Column, Row};
use std::time::Duration;
use tiberius::{Client, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type MssqlClient = Client<Compat<TcpStream>>;

static MSSQL_NULL: Option<&str> = None;

pub enum Connector {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
    /// A single TDS connection; runs are serialised on it.
    SqlServer(Mutex<Option<MssqlClient>>),
}

/// Bind every parameter onto a sqlx query, by value.
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for p in $params.iter() {
            q = match p {
                SqlParam::Null => q.bind(None::<String>),
                SqlParam::Bool(b) => q.bind(*b),
                SqlParam::Int(i) => q.bind(*i),
                SqlParam::Float(f) => q.bind(*f),
                SqlParam::Text(s) => q.bind(s.clone()),
                SqlParam::Blob(b) => q.bind(b.clone()),
            };
        }
        q
    }};
}

/// Fetch all rows and decode them with `$cell`.
macro_rules! fetch_sqlx {
    ($pool:expr, $sql:expr, $params:expr, $cell:path) => {{
        let rows = bind_all!(sqlx::query($sql), $params).fetch_all($pool).await?;
        let mut set = RowSet::new(
            rows.first()
                .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default(),
        );
        for row in &rows {
            set.rows.push((0..row.len()).map(|i| $cell(row, i)).collect());
        }
        set
    }};
}

/// Execute each record in one transaction; the first failure rolls back.
macro_rules! run_sqlx_batch {
    ($pool:expr, $sql:expr, $records:expr, $last_id:expr) => {{
        let mut tx = $pool.begin().await?;
        let mut summary = BatchSummary::default();
        for (i, record) in $records.iter().enumerate() {
            match bind_all!(sqlx::query($sql), record).execute(&mut *tx).await {
                Ok(done) => {
                    if i == 0 {
                        summary.last_insert_id = ($last_id)(&done);
                    }
                    summary.rows_affected += done.rows_affected();
                }
                Err(e) => {
                    if let Err(rb) = tx.rollback().await {
                        warn!("rollback after record {} failed: {rb}", i + 1);
                    }
                    return Err(SqlError::BatchFailed { row: i + 1, message: e.to_string() });
                }
            }
        }
        tx.commit().await?;
        summary.records_inserted = $records.len();
        summary
    }};
}

fn pool_options<DB: sqlx::Database>(settings: &PoolSettings, connect_timeout: Duration) -> PoolOptions<DB> {
    PoolOptions::<DB>::new()
        .max_connections(settings.max_open.max(1))
        .acquire_timeout(connect_timeout)
        .max_lifetime(settings.max_lifetime())
        .idle_timeout(settings.idle_timeout())
}

fn mssql_args(params: &[SqlParam]) -> Vec<&dyn ToSql> {
    params
        .iter()
        .map(|p| match p {
            SqlParam::Null => &MSSQL_NULL as &dyn ToSql,
            SqlParam::Bool(b) => b as &dyn ToSql,
            SqlParam::Int(i) => i as &dyn ToSql,
            SqlParam::Float(f) => f as &dyn ToSql,
            SqlParam::Text(s) => s as &dyn ToSql,
            SqlParam::Blob(b) => b as &dyn ToSql,
        })
        .collect()
}

/// Run a parameterless control statement and drain its stream.
async fn mssql_control(client: &mut MssqlClient, sql: &str) -> SqlResult<()> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}

impl Connector {
    /// Open and verify a connection. Pools come up with one live connection.
    pub async fn open(
        driver: Driver,
        dsn: &str,
        settings: &PoolSettings,
        connect_timeout: Duration,
    ) -> SqlResult<Self> {
        debug!("opening {driver} connector (max_open={})", settings.max_open);
        let connector = match driver {
            Driver::MySql => {
                let opts = dsn::mysql_options(dsn)?;
                Self::MySql(pool_options::<sqlx::MySql>(settings, connect_timeout).connect_with(opts).await?)
            }
            Driver::Postgres => {
                let opts = dsn::pg_options(dsn)?;
                Self::Postgres(pool_options::<sqlx::Postgres>(settings, connect_timeout).connect_with(opts).await?)
            }
            Driver::Sqlite => {
                let opts = dsn::sqlite_options(dsn)?;
                Self::Sqlite(pool_options::<sqlx::Sqlite>(settings, connect_timeout).connect_with(opts).await?)
            }
            Driver::SqlServer => {
                let config = dsn::mssql_config(dsn)?;
                let connect = async {
                    let tcp = TcpStream::connect(config.get_addr())
                        .await
                        .map_err(|e| SqlError::Connection(format!("TCP connect: {e}")))?;
                    tcp.set_nodelay(true).ok();
                    Client::connect(config, tcp.compat_write()).await.map_err(SqlError::from)
                };
                let client = tokio::time::timeout(connect_timeout, connect)
                    .await
                    .map_err(|_| SqlError::Connection(format!("timed out after {connect_timeout:?}")))??;
                Self::SqlServer(Mutex::new(Some(client)))
            }
        };
        info!("{driver} connector open");
        Ok(connector)
    }

    pub fn driver(&self) -> Driver {
        match self {
            Self::MySql(_) => Driver::MySql,
            Self::Postgres(_) => Driver::Postgres,
            Self::Sqlite(_) => Driver::Sqlite,
            Self::SqlServer(_) => Driver::SqlServer,
        }
    }

    /// Run a statement and fold any failure into the error envelope.
    pub async fn run(&self, query: &str, params: &[SqlParam]) -> SqlOutcome {
        self.try_run(query, params).await.into()
    }

    /// A single text argument against a `JSON[...]` statement is a batch
    /// payload; everything else runs as a plain parameterised statement.
    pub async fn try_run(&self, query: &str, params: &[SqlParam]) -> SqlResult<SqlOutcome> {
        if let [SqlParam::Text(payload)] = params {
            if Template::is_templated(query) {
                let template = Template::parse(query)?;
                let payload: Value =
                    serde_json::from_str(payload).map_err(|e| SqlError::InvalidPayload(e.to_string()))?;
                let records = template.bind_payload(&payload)?;
                let statement = template.render(self.driver());
                debug!("batch of {} record(s): {statement}", records.len());
                let summary = self.run_batch(&statement, &records).await?;
                return Ok(SqlOutcome::data(serde_json::to_string(&summary)?));
            }
        }

        let set = self.fetch(query, params).await?;
        render::to_outcome(query, set)
    }

    async fn fetch(&self, query: &str, params: &[SqlParam]) -> SqlResult<RowSet> {
        let set = match self {
            Self::MySql(pool) => fetch_sqlx!(pool, query, params, cells::mysql_cell),
            Self::Postgres(pool) => fetch_sqlx!(pool, query, params, cells::pg_cell),
            Self::Sqlite(pool) => fetch_sqlx!(pool, query, params, cells::sqlite_cell),
            Self::SqlServer(slot) => {
                let mut guard = slot.lock().await;
                let client = guard.as_mut().ok_or_else(closed)?;
                let args = mssql_args(params);
                let rows = client.query(query, &args).await?.into_first_result().await?;
                let mut set = RowSet::new(
                    rows.first()
                        .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
                        .unwrap_or_default(),
                );
                for row in rows {
                    set.rows.push(row.into_iter().map(|col| cells::mssql_cell(&col)).collect());
                }
                set
            }
        };
        Ok(set)
    }

    async fn run_batch(&self, statement: &str, records: &[Vec<SqlParam>]) -> SqlResult<BatchSummary> {
        let summary = match self {
            Self::MySql(pool) => {
                run_sqlx_batch!(pool, statement, records, |d: &MySqlQueryResult| d.last_insert_id() as i64)
            }
            Self::Postgres(pool) => run_sqlx_batch!(pool, statement, records, |_| 0i64),
            Self::Sqlite(pool) => {
                run_sqlx_batch!(pool, statement, records, |d: &SqliteQueryResult| d.last_insert_rowid())
            }
            Self::SqlServer(slot) => {
                let mut guard = slot.lock().await;
                let client = guard.as_mut().ok_or_else(closed)?;
                mssql_batch(client, statement, records).await?
            }
        };
        Ok(summary)
    }

    /// Close the pool or drop the client. Later runs fail with a connection error.
    pub async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
            Self::SqlServer(slot) => {
                slot.lock().await.take();
            }
        }
        debug!("{} connector closed", self.driver());
    }
}

async fn mssql_batch(
    client: &mut MssqlClient,
    statement: &str,
    records: &[Vec<SqlParam>],
) -> SqlResult<BatchSummary> {
    mssql_control(client, "BEGIN TRAN").await?;
    let mut summary = BatchSummary::default();
    for (i, record) in records.iter().enumerate() {
        let args = mssql_args(record);
        match client.execute(statement, &args).await {
            Ok(done) => summary.rows_affected += done.total(),
            Err(e) => {
                if let Err(rb) = mssql_control(client, "IF @@TRANCOUNT > 0 ROLLBACK TRAN").await {
                    warn!("rollback after record {} failed: {rb}", i + 1);
                }
                return Err(SqlError::BatchFailed { row: i + 1, message: e.to_string() });
            }
        }
    }
    mssql_control(client, "COMMIT TRAN").await?;
    summary.records_inserted = records.len();
    Ok(summary)
}

fn closed() -> SqlError {
    SqlError::Connection("connector is closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mssql_args_cover_every_param() {
        let params = vec![
            SqlParam::Null,
            SqlParam::Bool(true),
            SqlParam::Int(1),
            SqlParam::Float(0.5),
            SqlParam::Text("x".into()),
            SqlParam::Blob(vec![1, 2]),
        ];
        assert_eq!(mssql_args(&params).len(), params.len());
    }

    #[tokio::test]
    async fn memory_sqlite_round_trip() {
        let c = Connector::open(Driver::Sqlite, ":memory:", &PoolSettings::default(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(c.driver(), Driver::Sqlite);
        let out = c
            .run("SELECT 1 AS one, 'a' AS two, NULL AS three, x'6869' AS four", &[])
            .await;
        assert_eq!(out.json, r#"[{"one":1,"two":"a","three":null,"four":"aGk="}]"#);
        c.close().await;
        assert!(c.run("SELECT 1", &[]).await.is_error);
    }
}
