use crate::error::BridgeResult;
use hostbridge_ftp::TransferConfig;
use hostbridge_http::HttpConfig;
use hostbridge_sql::SqlConfig;
use serde::{Deserialize, Serialize};

/// Everything a host can tune, passed as JSON when the bridge is created.
/// Every field has a default, so `{}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_json: bool,
    /// Runtime worker threads; `None` keeps tokio's default (one per core).
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub sql: SqlConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_json: false,
            worker_threads: None,
            transfer: TransferConfig::default(),
            sql: SqlConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a host-supplied document. Blank input means defaults.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_ftp::DEFAULT_MAX_TRANSFER_BYTES;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(BridgeConfig::from_json("").unwrap(), BridgeConfig::default());
        assert_eq!(BridgeConfig::from_json("{}").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn nested_sections_fill_in() {
        let c = BridgeConfig::from_json(
            r#"{"logFilter":"debug","workerThreads":2,"transfer":{"ioTimeoutSec":5},"sql":{"pool":{"maxOpen":9}},"http":{"timeoutSec":4}}"#,
        )
        .unwrap();
        assert_eq!(c.log_filter, "debug");
        assert_eq!(c.worker_threads, Some(2));
        assert_eq!(c.transfer.io_timeout_sec, 5);
        assert_eq!(c.transfer.connect_timeout_sec, 30);
        assert_eq!(c.transfer.max_transfer_bytes, DEFAULT_MAX_TRANSFER_BYTES);
        assert_eq!(c.sql.pool.max_open, 9);
        assert_eq!(c.sql.connect_timeout_sec, 30);
        assert_eq!(c.http.timeout_sec, 4);
        assert_eq!(c.http.connect_timeout_sec, 30);
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(BridgeConfig::from_json("{\"logJson\": \"yes\"}").is_err());
        assert!(BridgeConfig::from_json("not json").is_err());
    }
}
