//! Data-connection transfer helpers.
//!
//! Downloads are capped: hitting the cap truncates, it does not fail. An
//! empty result is always an error for the caller to surface.

use crate::ftp::error::{TransferError, TransferResult};
use crate::ftp::protocol::with_deadline;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CHUNK: usize = 64 * 1024;

/// What a capped read produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Capped {
    pub data: Vec<u8>,
    /// The cap was reached before EOF; the sender may still have had more.
    pub truncated: bool,
}

/// Read until EOF or until `cap` bytes have been accumulated.
///
/// Each read is bounded by `deadline`.
pub async fn read_capped<R>(reader: &mut R, cap: u64, deadline: Duration) -> TransferResult<Capped>
where
    R: AsyncRead + Unpin,
{
    let cap = usize::try_from(cap).unwrap_or(usize::MAX);
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; CHUNK];
    while buf.len() < cap {
        let want = (cap - buf.len()).min(CHUNK);
        let n = with_deadline(deadline, "data read", reader.read(&mut chunk[..want]))
            .await
            .map_err(data_error)?;
        if n == 0 {
            return Ok(Capped { data: buf, truncated: false });
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    log::warn!("transfer reached the {} byte cap; result truncated", cap);
    Ok(Capped { data: buf, truncated: true })
}

/// Write the whole payload, then close our side so the server sees EOF.
pub async fn write_all<W>(writer: &mut W, data: &[u8], deadline: Duration) -> TransferResult<()>
where
    W: AsyncWrite + Unpin,
{
    for part in data.chunks(CHUNK) {
        with_deadline(deadline, "data write", writer.write_all(part))
            .await
            .map_err(data_error)?;
    }
    with_deadline(deadline, "data shutdown", writer.shutdown())
        .await
        .map_err(data_error)
}

/// Zero bytes is never a successful download.
pub fn ensure_not_empty(data: Vec<u8>, path: &str) -> TransferResult<Vec<u8>> {
    if data.is_empty() {
        return Err(TransferError::empty_transfer(path));
    }
    Ok(data)
}

/// Bytes received in ASCII mode → caller text: CRLF to LF, outer whitespace trimmed.
pub fn normalize_download_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace("\r\n", "\n").trim().to_string()
}

/// Caller text → bytes to send in ASCII mode, every line ending as CRLF.
pub fn normalize_upload_text(text: &str) -> Vec<u8> {
    text.replace("\r\n", "\n").replace('\n', "\r\n").into_bytes()
}

fn data_error(e: TransferError) -> TransferError {
    // Timeouts keep their own kind; everything else on this socket is a data-channel failure.
    match e.kind {
        crate::ftp::TransferErrorKind::Timeout => e,
        _ => e.recast(crate::ftp::TransferErrorKind::DataChannelFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ftp::TransferErrorKind;

    #[tokio::test]
    async fn reads_until_eof() {
        let mut src: &[u8] = b"hello world";
        let out = read_capped(&mut src, 1024, Duration::from_secs(1)).await.unwrap();
        assert_eq!(out.data, b"hello world");
        assert!(!out.truncated);
    }

    #[tokio::test]
    async fn cap_truncates_without_error() {
        let payload = vec![7u8; 200_000];
        let mut src: &[u8] = &payload;
        let out = read_capped(&mut src, 100_000, Duration::from_secs(1)).await.unwrap();
        assert_eq!(out.data.len(), 100_000);
        assert!(out.truncated);
    }

    #[tokio::test]
    async fn empty_download_is_an_error() {
        let mut src: &[u8] = b"";
        let out = read_capped(&mut src, 1024, Duration::from_secs(1)).await.unwrap();
        let err = ensure_not_empty(out.data, "/x").unwrap_err();
        assert_eq!(err.kind, TransferErrorKind::EmptyTransfer);
    }

    #[tokio::test]
    async fn writes_whole_payload() {
        let mut sink: Vec<u8> = Vec::new();
        let payload = vec![1u8; CHUNK * 2 + 10];
        write_all(&mut sink, &payload, Duration::from_secs(1)).await.unwrap();
        assert_eq!(sink.len(), payload.len());
    }

    #[test]
    fn download_text_normalisation() {
        assert_eq!(normalize_download_text(b"  a\r\nb\r\n\r\n"), "a\nb");
    }

    #[test]
    fn upload_text_normalisation() {
        assert_eq!(normalize_upload_text("a\nb\r\nc"), b"a\r\nb\r\nc".to_vec());
    }
}
