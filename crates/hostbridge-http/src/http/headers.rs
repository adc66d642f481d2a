//! Header blocks: newline-separated `Key: Value` lines.

use crate::http::error::{HttpError, HttpResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// `"key: value"`.
pub fn header_line(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}

pub fn bearer_auth_line(token: &str) -> String {
    header_line("Authorization", &format!("Bearer {token}"))
}

/// `Authorization: Basic base64(user:pass)`.
pub fn basic_auth_line(user: &str, pass: &str) -> String {
    let encoded = STANDARD.encode(format!("{user}:{pass}"));
    header_line("Authorization", &format!("Basic {encoded}"))
}

/// Parse a header block. Blank lines and lines without a colon are
/// skipped; names and values are trimmed. Repeated names are appended,
/// not replaced. A name or value that cannot go on the wire is an error.
pub fn parse_header_block(block: &str) -> HttpResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            debug!("skipping header line without a colon: {line:?}");
            continue;
        };
        let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|e| HttpError::invalid_header(line, e))?;
        let value = HeaderValue::from_str(value.trim()).map_err(|e| HttpError::invalid_header(line, e))?;
        map.append(name, value);
    }
    Ok(map)
}
