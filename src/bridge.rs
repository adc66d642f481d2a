//! The object a host holds: one runtime plus the transfer, HTTP and SQL
//! services.
//!
//! Every method blocks the calling (host) thread until the operation is
//! done. Calls from several host threads run concurrently on the runtime.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::logging;
use hostbridge_ftp::{TransferResult, TransferService};
use hostbridge_http::{HttpClient, HttpMethod, HttpResponse, HttpResult};
use hostbridge_sql::{ConnectionRegistry, ConnectorHandle, PoolSettings, SqlOutcome, SqlParam, SqlResult};
use log::{debug, info};
use tokio::runtime::{Builder, Runtime};

pub struct Bridge {
    runtime: Runtime,
    transfers: TransferService,
    http: HttpClient,
    sql: ConnectionRegistry,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        logging::init(&config);

        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name("hostbridge-worker");
        if let Some(n) = config.worker_threads.filter(|n| *n > 0) {
            builder.worker_threads(n);
        }
        let runtime = builder.build().map_err(BridgeError::Runtime)?;
        let http = HttpClient::new(config.http.clone()).map_err(BridgeError::HttpClient)?;

        info!(
            "bridge ready (workers={:?}, io_timeout={}s, max_transfer={} bytes)",
            config.worker_threads, config.transfer.io_timeout_sec, config.transfer.max_transfer_bytes
        );
        Ok(Self {
            runtime,
            transfers: TransferService::new(config.transfer.clone()),
            http,
            sql: ConnectionRegistry::new(config.sql.clone()),
            config,
        })
    }

    pub fn from_json(json: &str) -> BridgeResult<Self> {
        Self::new(BridgeConfig::from_json(json)?)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ── Transfers ───────────────────────────────────────────────

    pub fn get_file(&self, url: &str) -> TransferResult<Vec<u8>> {
        self.runtime.block_on(self.transfers.get_file(url))
    }

    pub fn get_text(&self, url: &str) -> TransferResult<String> {
        self.runtime.block_on(self.transfers.get_text(url))
    }

    pub fn put_file(&self, data: &[u8], url: &str) -> TransferResult<()> {
        self.runtime.block_on(self.transfers.put_file(data, url))
    }

    pub fn put_text(&self, text: &str, url: &str) -> TransferResult<()> {
        self.runtime.block_on(self.transfers.put_text(text, url))
    }

    pub fn create_dir(&self, url: &str) -> TransferResult<()> {
        self.runtime.block_on(self.transfers.create_dir(url))
    }

    pub fn list_files(&self, url: &str) -> TransferResult<Vec<String>> {
        self.runtime.block_on(self.transfers.list_files(url))
    }

    // ── HTTP ────────────────────────────────────────────────────

    pub fn http_request(&self, method: HttpMethod, url: &str, headers: &str, body: &str) -> HttpResult<HttpResponse> {
        self.runtime.block_on(self.http.request(method, url, headers, body))
    }

    // ── SQL ─────────────────────────────────────────────────────

    pub fn sql_run(&self, driver: &str, dsn: &str, query: &str, params: &[SqlParam]) -> SqlOutcome {
        self.runtime.block_on(self.sql.run_once(driver, dsn, query, params))
    }

    pub fn sql_load(&self, driver: &str, dsn: &str, settings: Option<PoolSettings>) -> SqlResult<ConnectorHandle> {
        self.runtime.block_on(self.sql.load(driver, dsn, settings))
    }

    pub fn sql_run_on(&self, handle: ConnectorHandle, query: &str, params: &[SqlParam]) -> SqlOutcome {
        self.runtime.block_on(self.sql.run_on(handle, query, params))
    }

    pub fn sql_close(&self, handle: ConnectorHandle) -> SqlResult<()> {
        self.runtime.block_on(self.sql.close(handle))
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        debug!("bridge shutting down, closing open connectors");
        self.runtime.block_on(self.sql.close_all());
    }
}
