//! # hostbridge-ftp — single-shot FTP / SFTP transfers
//!
//! Every public operation is a fresh connect → authenticate → act →
//! disconnect cycle. Nothing is pooled and nothing is shared between calls.
//!
//! Architecture:
//! - `types` — transfer config, reply and command types
//! - `error` — categorised error with stable host-facing codes
//! - `target` — `ftp://` / `sftp://` URL resolution
//! - `protocol` — control-channel line codec with deadlines
//! - `pasv` — `227` reply address extraction
//! - `session` — typestate control-session state machine
//! - `transfer` — capped data-connection copy and text normalisation
//! - `listing` — LIST output to entry names
//! - `sftp` — the same operations over an SSH file-transfer subsystem
//! - `service` — scheme dispatch for the public operations

pub mod types;
pub mod error;
pub mod target;
pub mod protocol;
pub mod pasv;
pub mod session;
pub mod transfer;
pub mod listing;
pub mod sftp;
pub mod service;

pub use types::*;
pub use error::{TransferError, TransferErrorKind, TransferResult};
pub use target::{ConnectionTarget, Scheme};
pub use service::TransferService;
