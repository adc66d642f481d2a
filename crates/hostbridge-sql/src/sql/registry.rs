//! Open connectors, addressed by handle.
//!
//! Loading the same `driver:dsn` twice returns the handle that is already
//! open. One-shot runs bypass the map entirely.

use crate::sql::connector::Connector;
use crate::sql::error::{SqlError, SqlResult};
use crate::sql::params::SqlParam;
use crate::sql::types::{Driver, PoolSettings, SqlConfig, SqlOutcome};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type ConnectorHandle = u64;

#[derive(Default)]
struct Inner {
    keys: HashMap<String, ConnectorHandle>,
    connectors: HashMap<ConnectorHandle, (String, Arc<Connector>)>,
    next: ConnectorHandle,
}

pub struct ConnectionRegistry {
    config: SqlConfig,
    inner: Mutex<Inner>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(SqlConfig::default())
    }
}

impl ConnectionRegistry {
    pub fn new(config: SqlConfig) -> Self {
        Self { config, inner: Mutex::new(Inner::default()) }
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// Open (or reuse) a connector. Pool settings apply only when it is
    /// first opened.
    pub async fn load(
        &self,
        driver: &str,
        dsn: &str,
        settings: Option<PoolSettings>,
    ) -> SqlResult<ConnectorHandle> {
        let driver = Driver::from_name(driver)?;
        let key = format!("{driver}:{dsn}");

        // Held across the open so two loads of one key cannot race.
        let mut inner = self.inner.lock().await;
        if let Some(&handle) = inner.keys.get(&key) {
            return Ok(handle);
        }

        let settings = settings.unwrap_or_else(|| self.config.pool.clone());
        let connector = Connector::open(driver, dsn, &settings, self.config.connect_timeout()).await?;

        inner.next += 1;
        let handle = inner.next;
        inner.keys.insert(key.clone(), handle);
        inner.connectors.insert(handle, (key, Arc::new(connector)));
        info!("{driver} connector loaded as handle {handle}");
        Ok(handle)
    }

    async fn get(&self, handle: ConnectorHandle) -> SqlResult<Arc<Connector>> {
        self.inner
            .lock()
            .await
            .connectors
            .get(&handle)
            .map(|(_, c)| c.clone())
            .ok_or(SqlError::UnknownHandle(handle))
    }

    pub async fn run_on(&self, handle: ConnectorHandle, query: &str, params: &[SqlParam]) -> SqlOutcome {
        match self.get(handle).await {
            Ok(connector) => connector.run(query, params).await,
            Err(e) => SqlOutcome::failed(e),
        }
    }

    /// Open a private connector, run one statement, close it.
    pub async fn run_once(&self, driver: &str, dsn: &str, query: &str, params: &[SqlParam]) -> SqlOutcome {
        let opened = match Driver::from_name(driver) {
            Ok(driver) => Connector::open(driver, dsn, &self.config.pool, self.config.connect_timeout()).await,
            Err(e) => Err(e),
        };
        match opened {
            Ok(connector) => {
                let outcome = connector.run(query, params).await;
                connector.close().await;
                outcome
            }
            Err(e) => SqlOutcome::failed(e),
        }
    }

    pub async fn close(&self, handle: ConnectorHandle) -> SqlResult<()> {
        let connector = {
            let mut inner = self.inner.lock().await;
            let (key, connector) = inner.connectors.remove(&handle).ok_or(SqlError::UnknownHandle(handle))?;
            inner.keys.remove(&key);
            connector
        };
        connector.close().await;
        info!("connector handle {handle} closed");
        Ok(())
    }

    pub async fn close_all(&self) {
        let drained: Vec<(ConnectorHandle, Arc<Connector>)> = {
            let mut inner = self.inner.lock().await;
            inner.keys.clear();
            inner.connectors.drain().map(|(h, (_, c))| (h, c)).collect()
        };
        for (handle, connector) in drained {
            connector.close().await;
            info!("connector handle {handle} closed");
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.connectors.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
