//! Transfer error type.
//!
//! Every kind maps to a stable negative code so the host can branch on
//! failures without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised transfer error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferError {
    pub kind: TransferErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub reply_code: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferErrorKind {
    /// Nothing to upload.
    EmptyData,
    EmptyUrl,
    UnsupportedScheme,
    /// Host or username absent from the URL.
    MissingCredentials,
    MissingPath,
    ConnectionFailed,
    /// The server greeting never arrived.
    InitialReadFailed,
    AuthFailed,
    MkdirFailed,
    MalformedPasvResponse,
    /// A file already occupies the requested directory name.
    FileConflict,
    /// The data connection could not be dialed or broke mid-transfer.
    DataChannelFailed,
    /// Missing `150` before or `226` after a data transfer.
    TransferNotConfirmed,
    SftpConnection,
    SftpClient,
    SftpOperation,
    /// The download completed with zero bytes.
    EmptyTransfer,
    InvalidUrl,
    /// Server sent an un-parseable response.
    ProtocolError,
    Disconnected,
    Timeout,
    IoError,
}

impl TransferErrorKind {
    /// Stable code reported across the FFI boundary.
    pub fn code(self) -> i32 {
        match self {
            Self::EmptyData => -1,
            Self::EmptyUrl => -2,
            Self::UnsupportedScheme => -3,
            Self::MissingCredentials => -4,
            Self::MissingPath => -5,
            Self::ConnectionFailed => -6,
            Self::InitialReadFailed => -7,
            Self::AuthFailed => -9,
            Self::MkdirFailed => -12,
            Self::MalformedPasvResponse => -14,
            Self::FileConflict => -17,
            Self::DataChannelFailed => -22,
            Self::TransferNotConfirmed => -23,
            Self::SftpConnection => -25,
            Self::SftpClient => -26,
            Self::SftpOperation => -27,
            Self::EmptyTransfer => -28,
            Self::InvalidUrl => -29,
            Self::ProtocolError => -30,
            Self::Disconnected => -31,
            Self::Timeout => -32,
            Self::IoError => -33,
        }
    }

    /// Input errors are rejected before any connection is attempted.
    pub fn is_input_error(self) -> bool {
        matches!(
            self,
            Self::EmptyData
                | Self::EmptyUrl
                | Self::UnsupportedScheme
                | Self::MissingCredentials
                | Self::MissingPath
                | Self::InvalidUrl
        )
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

// ── Construction helpers ─────────────────────────────────────────────

impl TransferError {
    pub fn new(kind: TransferErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            reply_code: None,
        }
    }

    pub fn with_reply(mut self, code: u16) -> Self {
        self.reply_code = Some(code);
        self
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// Re-label an error with a transition-specific kind, keeping the detail.
    pub fn recast(self, kind: TransferErrorKind) -> Self {
        Self { kind, ..self }
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::ConnectionFailed, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::AuthFailed, msg)
    }

    pub fn data_channel(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::DataChannelFailed, msg)
    }

    pub fn not_confirmed(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::TransferNotConfirmed, msg)
    }

    pub fn malformed_pasv(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::MalformedPasvResponse, msg)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::ProtocolError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::IoError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::Timeout, msg)
    }

    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::Disconnected, msg)
    }

    pub fn empty_transfer(path: &str) -> Self {
        Self::new(
            TransferErrorKind::EmptyTransfer,
            format!("no data received for '{}'", path),
        )
    }

    pub fn file_conflict(path: &str) -> Self {
        Self::new(
            TransferErrorKind::FileConflict,
            format!("a file already exists at '{}'", path),
        )
    }

    pub fn sftp_connection(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::SftpConnection, msg)
    }

    pub fn sftp_client(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::SftpClient, msg)
    }

    pub fn sftp_operation(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorKind::SftpOperation, msg)
    }

    /// An unexpected reply, attributed to the transition that received it.
    pub fn unexpected_reply(kind: TransferErrorKind, expected: &str, code: u16, text: &str) -> Self {
        Self::new(kind, format!("expected {}, got: {}", expected, text)).with_reply(code)
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.reply_code {
            write!(f, "[{:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for TransferError {}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(format!("I/O timeout: {}", e)),
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => Self::disconnected(e.to_string()),
            _ => Self::io_error(e.to_string()),
        }
    }
}

impl From<ssh2::Error> for TransferError {
    fn from(e: ssh2::Error) -> Self {
        Self::sftp_operation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(TransferErrorKind::EmptyData.code(), -1);
        assert_eq!(TransferErrorKind::MissingCredentials.code(), -4);
        assert_eq!(TransferErrorKind::FileConflict.code(), -17);
        assert_eq!(TransferErrorKind::SftpOperation.code(), -27);
    }

    #[test]
    fn display_includes_reply_code() {
        let e = TransferError::unexpected_reply(TransferErrorKind::AuthFailed, "230", 530, "530 Login incorrect");
        assert_eq!(e.to_string(), "[AuthFailed 530] expected 230, got: 530 Login incorrect");
    }

    #[test]
    fn io_timeout_maps_to_timeout() {
        let e: TransferError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(e.kind, TransferErrorKind::Timeout);
    }
}
