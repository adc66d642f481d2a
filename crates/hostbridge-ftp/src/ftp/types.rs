//! Shared types for the transfer crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard cap on a single download, in bytes (90 MiB).
pub const DEFAULT_MAX_TRANSFER_BYTES: u64 = 90 * 1024 * 1024;

// ─── Configuration ───────────────────────────────────────────────────

/// Deadlines and limits applied to every transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    /// Dial timeout for the control, data and SSH connections.
    #[serde(default = "default_timeout")]
    pub connect_timeout_sec: u64,
    /// Per-read / per-write deadline on the control and data connections.
    #[serde(default = "default_timeout")]
    pub io_timeout_sec: u64,
    #[serde(default = "default_max_transfer")]
    pub max_transfer_bytes: u64,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_transfer() -> u64 {
    DEFAULT_MAX_TRANSFER_BYTES
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_sec: default_timeout(),
            io_timeout_sec: default_timeout(),
            max_transfer_bytes: default_max_transfer(),
        }
    }
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_sec)
    }
}

// ─── Protocol ────────────────────────────────────────────────────────

/// Transfer type (RFC 959 TYPE command).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    pub fn command(self) -> &'static str {
        match self {
            Self::Ascii => "TYPE A",
            Self::Binary => "TYPE I",
        }
    }
}

/// A command that moves bytes over the data connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferCommand {
    Retrieve(String),
    Store(String),
    List(String),
}

impl TransferCommand {
    pub fn to_wire(&self) -> String {
        match self {
            Self::Retrieve(p) => format!("RETR {}", p),
            Self::Store(p) => format!("STOR {}", p),
            Self::List(p) => format!("LIST {}", p),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "RETR",
            Self::Store(_) => "STOR",
            Self::List(_) => "LIST",
        }
    }
}

/// A parsed FTP server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the reply code starts with `prefix` (e.g. `"331"` or `"2"`).
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.code.to_string().starts_with(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: TransferConfig = serde_json::from_str(r#"{"ioTimeoutSec":5}"#).unwrap();
        assert_eq!(cfg.connect_timeout_sec, 30);
        assert_eq!(cfg.io_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.max_transfer_bytes, 94_371_840);
    }

    #[test]
    fn response_prefix() {
        let resp = FtpResponse { code: 331, lines: vec!["331 Password required".into()] };
        assert!(resp.has_prefix("331"));
        assert!(resp.has_prefix("3"));
        assert!(!resp.has_prefix("230"));
    }

    #[test]
    fn transfer_command_wire_form() {
        assert_eq!(TransferCommand::Store("a/b.txt".into()).to_wire(), "STOR a/b.txt");
        assert_eq!(TransferType::Binary.command(), "TYPE I");
    }
}
