//! # hostbridge-http — outbound HTTP requests
//!
//! One request per call: method, URL, a header block of `Key: Value`
//! lines and an optional body go out, status, headers and body text come
//! back. Any status the server answers with is a response, not an error.
//!
//! Architecture:
//! - `types` — client config, method and response types
//! - `error` — categorised error with stable host-facing codes
//! - `headers` — header-block parsing and line builders
//! - `client` — the reqwest-backed client

pub mod types;
pub mod error;
pub mod headers;
pub mod client;

pub use types::*;
pub use error::{HttpError, HttpErrorKind, HttpResult};
pub use headers::{header_line, basic_auth_line, bearer_auth_line, parse_header_block};
pub use client::HttpClient;
