//! # hostbridge-sql — SQL execution with JSON results
//!
//! - `types` — driver names, pool settings, outcome envelope
//! - `error` — `SqlError`
//! - `params` — typed bind parameters decoded from the tagged string form
//! - `template` — the `JSON[...]` batch statement language
//! - `dsn` — driver-native connection strings → connect options
//! - `cells` — per-backend column decoding into JSON values
//! - `render` — row sets → result JSON
//! - `connector` — one open database (pool or client) and its run paths
//! - `registry` — connectors keyed by `driver:dsn`, addressed by handle

pub mod types;
pub mod error;
pub mod params;
pub mod template;
pub mod dsn;
pub mod cells;
pub mod render;
pub mod connector;
pub mod registry;

pub use types::*;
pub use error::{SqlError, SqlResult};
pub use params::SqlParam;
pub use template::Template;
pub use connector::Connector;
pub use registry::{ConnectionRegistry, ConnectorHandle};
