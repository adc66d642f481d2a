//! Host bridge: FTP/SFTP transfers, HTTP requests, SQL execution returning
//! JSON, JSON document helpers and local file helpers behind one C ABI.

pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod files;
pub mod json;
pub mod logging;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use hostbridge_ftp::{TransferConfig, TransferError, TransferErrorKind, TransferService};
pub use hostbridge_http::{HttpClient, HttpConfig, HttpError, HttpMethod, HttpResponse};
pub use hostbridge_sql::{ConnectionRegistry, SqlConfig, SqlOutcome, SqlParam};
