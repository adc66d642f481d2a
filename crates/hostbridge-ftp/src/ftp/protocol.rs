//! Low-level FTP command/response codec (RFC 959 §4).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading single-line and multi-line replies
//! - Parsing the 3-digit reply code
//!
//! Every read and write is bounded by the I/O deadline.

use crate::ftp::error::{TransferError, TransferResult};
use crate::ftp::types::FtpResponse;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// The FTP command/response codec operating on split halves.
pub struct FtpCodec {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    io_timeout: Duration,
}

impl FtpCodec {
    pub fn new(stream: TcpStream, io_timeout: Duration) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            reader: BufReader::new(rd),
            writer: wr,
            io_timeout,
        }
    }

    /// Write one command line; the CRLF terminator is appended here.
    pub async fn send_command(&mut self, cmd: &str) -> TransferResult<()> {
        let line = format!("{}\r\n", cmd);
        let deadline = self.io_timeout;
        with_deadline(deadline, "write", self.writer.write_all(line.as_bytes())).await?;
        log::trace!(">>> {}", mask_secret(cmd));
        Ok(())
    }

    /// Read a single line from the control channel (including CRLF).
    ///
    /// Servers are free to send Latin-1 text; only the code prefix is
    /// parsed, so the rest of the line is decoded lossily.
    async fn read_line_raw(&mut self) -> TransferResult<String> {
        let mut buf = Vec::new();
        let deadline = self.io_timeout;
        let n = with_deadline(deadline, "read", self.reader.read_until(b'\n', &mut buf)).await?;
        if n == 0 {
            return Err(TransferError::disconnected("server closed the control connection"));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Read a complete FTP response (possibly multi-line).
    ///
    /// Multi-line responses look like:
    /// ```text
    /// 220-Welcome to my FTP server
    /// 220-This is line 2
    /// 220 End of greeting
    /// ```
    pub async fn read_response(&mut self) -> TransferResult<FtpResponse> {
        let first = self.read_line_raw().await?;
        let first_trimmed = first.trim_end_matches(['\r', '\n']);

        let code = parse_code(first_trimmed)?;
        let mut lines = vec![first_trimmed.to_string()];

        if first_trimmed.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line_raw().await?;
                let next_trimmed = next.trim_end_matches(['\r', '\n']);
                lines.push(next_trimmed.to_string());
                if next_trimmed.starts_with(&terminator) || next_trimmed == terminator.trim_end() {
                    break;
                }
            }
        }

        let resp = FtpResponse { code, lines };
        log::trace!("<<< {}", resp.lines.last().map(String::as_str).unwrap_or_default());
        Ok(resp)
    }

    /// Send a command and return the response.
    pub async fn execute(&mut self, cmd: &str) -> TransferResult<FtpResponse> {
        self.send_command(cmd).await?;
        self.read_response().await
    }

    pub async fn shutdown(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            log::debug!("control shutdown: {}", e);
        }
    }
}

/// Run an I/O future under `deadline`, folding the elapsed case into
/// [`TransferError::timeout`].
pub async fn with_deadline<T, F>(deadline: Duration, what: &str, fut: F) -> TransferResult<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| TransferError::timeout(format!("{} timed out after {:?}", what, deadline)))?
        .map_err(TransferError::from)
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> TransferResult<u16> {
    let head = line
        .get(..3)
        .ok_or_else(|| TransferError::protocol_error(format!("response too short: '{}'", line)))?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransferError::protocol_error(format!("invalid reply code in: '{}'", line)));
    }
    head.parse::<u16>()
        .map_err(|_| TransferError::protocol_error(format!("invalid reply code in: '{}'", line)))
}

fn mask_secret(cmd: &str) -> &str {
    if cmd.get(..4).is_some_and(|verb| verb.eq_ignore_ascii_case("PASS")) {
        "PASS ****"
    } else {
        cmd
    }
}
