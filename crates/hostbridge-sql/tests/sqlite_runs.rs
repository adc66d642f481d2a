use hostbridge_sql::{ConnectionRegistry, PoolSettings, SqlParam};
use serde_json::{json, Value};
use tempfile::TempDir;

const SCHEMA: &str = "CREATE TABLE docs (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, data BLOB)";

struct Db {
    _dir: TempDir,
    dsn: String,
    registry: ConnectionRegistry,
}

async fn fresh_db() -> Db {
    let dir = tempfile::tempdir().unwrap();
    let dsn = dir.path().join("bridge.db").to_string_lossy().into_owned();
    let registry = ConnectionRegistry::default();
    let out = registry.run_once("sqlite3", &dsn, SCHEMA, &[]).await;
    assert!(!out.is_error, "{}", out.json);
    Db { _dir: dir, dsn, registry }
}

impl Db {
    async fn run(&self, query: &str, params: &[SqlParam]) -> (Value, bool) {
        let out = self.registry.run_once("sqlite3", &self.dsn, query, params).await;
        (serde_json::from_str(&out.json).unwrap(), out.is_error)
    }

    async fn count(&self) -> i64 {
        let (v, _) = self.run("SELECT COUNT(*) AS n FROM docs", &[]).await;
        v[0]["n"].as_i64().unwrap()
    }
}

fn payload(v: Value) -> Vec<SqlParam> {
    vec![SqlParam::Text(v.to_string())]
}

#[tokio::test]
async fn create_reports_status_ok() {
    let db = fresh_db().await;
    let out = db
        .registry
        .run_once("sqlite3", &db.dsn, "CREATE TABLE other (x INTEGER)", &[])
        .await;
    assert_eq!(out.json, r#"{"status":"OK"}"#);
    assert!(out.is_empty && !out.is_error);
}

#[tokio::test]
async fn batch_insert_commits_every_record() {
    let db = fresh_db().await;
    let (summary, is_error) = db
        .run(
            "INSERT INTO docs(name, data) VALUES(JSON[name, BLOB(data)])",
            &payload(json!([{"name": "a", "data": "aGk="}, {"name": "b", "data": null}])),
        )
        .await;
    assert!(!is_error, "{summary}");
    assert_eq!(summary, json!({"last_insert_id": 1, "rows_affected": 2, "records_inserted": 2}));

    let (rows, _) = db.run("SELECT name, data FROM docs ORDER BY id", &[]).await;
    assert_eq!(rows, json!([{"name": "a", "data": "aGk="}, {"name": "b", "data": null}]));
}

#[tokio::test]
async fn failing_record_rolls_back_the_batch() {
    let db = fresh_db().await;
    let (out, is_error) = db
        .run(
            "INSERT INTO docs(name) VALUES(JSON[name])",
            &payload(json!([{"name": "dup"}, {"name": "dup"}])),
        )
        .await;
    assert!(is_error);
    let msg = out["error"].as_str().unwrap();
    assert!(msg.starts_with("record 2 failed, batch rolled back"), "{msg}");
    assert_eq!(db.count().await, 0);
}

#[tokio::test]
async fn bad_blob_fails_before_anything_runs() {
    let db = fresh_db().await;
    let (out, is_error) = db
        .run(
            "INSERT INTO docs(name, data) VALUES(JSON[name, BLOB(data)])",
            &payload(json!([{"name": "ok", "data": "aGk="}, {"name": "bad", "data": "%%%"}])),
        )
        .await;
    assert!(is_error);
    assert!(out["error"].as_str().unwrap().contains("record 2"));
    assert_eq!(db.count().await, 0);
}

#[tokio::test]
async fn templated_query_needs_valid_json() {
    let db = fresh_db().await;
    let (out, is_error) = db
        .run("INSERT INTO docs(name) VALUES(JSON[name])", &[SqlParam::Text("{not json".into())])
        .await;
    assert!(is_error);
    assert!(out["error"].as_str().unwrap().contains("valid JSON payload"));

    let (_, is_error) = db.run("INSERT INTO docs(name) VALUES(JSON[name])", &payload(json!([]))).await;
    assert!(is_error);
}

#[tokio::test]
async fn tagged_arguments_bind_typed() {
    let db = fresh_db().await;
    let params = SqlParam::from_tagged_all(&["int::7", "plain", "blob::aGk="]).unwrap();
    let (_, is_error) = db.run("INSERT INTO docs(id, name, data) VALUES(?, ?, ?)", &params).await;
    assert!(!is_error);

    let (rows, _) = db
        .run("SELECT id, name, data FROM docs WHERE id = ?", &[SqlParam::Int(7)])
        .await;
    assert_eq!(rows, json!([{"id": 7, "name": "plain", "data": "aGk="}]));
}

#[tokio::test]
async fn empty_select_and_json_column() {
    let db = fresh_db().await;
    let out = db.registry.run_once("sqlite3", &db.dsn, "SELECT * FROM docs", &[]).await;
    assert_eq!(out.json, "[]");
    assert!(out.is_empty);

    let (rows, _) = db.run("SELECT 2.5 AS r, 'x' AS s", &[]).await;
    assert_eq!(rows, json!([{"r": 2.5, "s": "x"}]));

    let (rows, _) = db.run(r#"SELECT 2.5 AS r, '{"a":[1,2]}' AS Json"#, &[]).await;
    assert_eq!(rows, json!([{"a": [1, 2]}]));
}

#[tokio::test]
async fn sql_errors_are_enveloped() {
    let db = fresh_db().await;
    let (out, is_error) = db.run("SELECT * FROM missing_table", &[]).await;
    assert!(is_error);
    assert!(out["error"].as_str().unwrap().starts_with("query failed"));
}

#[tokio::test]
async fn registry_handles() {
    let db = fresh_db().await;
    let settings = PoolSettings { max_open: 2, ..Default::default() };
    let a = db.registry.load("sqlite3", &db.dsn, Some(settings)).await.unwrap();
    let b = db.registry.load("sqlite", &db.dsn, None).await.unwrap();
    assert_eq!(a, b);

    let out = db.registry.run_on(a, "SELECT 1 AS one", &[]).await;
    assert_eq!(out.json, r#"[{"one":1}]"#);

    db.registry.close(a).await.unwrap();
    assert!(db.registry.close(a).await.is_err());
    let out = db.registry.run_on(a, "SELECT 1", &[]).await;
    assert!(out.is_error);
    assert!(out.json.contains("unknown connector handle"));

    db.registry.close_all().await;
    assert!(db.registry.is_empty().await);
}

#[tokio::test]
async fn oracle_is_rejected() {
    let registry = ConnectionRegistry::default();
    let out = registry.run_once("godror", "user/pass@db", "SELECT 1 FROM dual", &[]).await;
    assert!(out.is_error);
    assert!(out.json.contains("unsupported driver"));
}
