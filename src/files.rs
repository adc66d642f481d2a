//! Local file helpers exposed next to the transfer operations.
//!
//! Binary content crosses the boundary as standard base64, the same
//! encoding the transfer and SQL paths use.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid base64 content: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not valid UTF-8 text")]
    NotText(String),
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidBase64(_) => -110,
            Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => -111,
            Self::Io { .. } => -112,
            Self::NotText(_) => -113,
        }
    }
}

pub type FileResult<T> = Result<T, FileError>;

/// Decode `b64` and write the bytes, replacing any existing file.
pub fn write_binary(b64: &str, path: impl AsRef<Path>) -> FileResult<()> {
    let data = STANDARD.decode(b64.trim())?;
    let path = path.as_ref();
    fs::write(path, data).map_err(|e| FileError::io(path, e))
}

pub fn write_text(text: &str, path: impl AsRef<Path>) -> FileResult<()> {
    let path = path.as_ref();
    fs::write(path, text).map_err(|e| FileError::io(path, e))
}

pub fn read_binary(path: impl AsRef<Path>) -> FileResult<String> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| FileError::io(path, e))?;
    Ok(STANDARD.encode(data))
}

pub fn read_text(path: impl AsRef<Path>) -> FileResult<String> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| FileError::io(path, e))?;
    String::from_utf8(data).map_err(|_| FileError::NotText(path.display().to_string()))
}

/// Create `path` and any missing parents. Existing directories are fine.
pub fn create_dir(path: impl AsRef<Path>) -> FileResult<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|e| FileError::io(path, e))
}

/// Any stat failure, not only "not found", counts as absent.
pub fn path_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).is_ok()
}

/// Names of the non-directory entries of `dir`, sorted.
pub fn list_files(dir: impl AsRef<Path>) -> FileResult<Vec<String>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| FileError::io(dir, e))? {
        let entry = entry.map_err(|e| FileError::io(dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Best-effort MIME type of base64 content from its leading bytes.
pub fn content_type(b64: &str) -> &'static str {
    const OCTET: &str = "application/octet-stream";
    let data = match STANDARD.decode(b64.trim()) {
        Ok(d) if !d.is_empty() => d,
        _ => return OCTET,
    };

    let magic: &[(&[u8], &str)] = &[
        (&b"%PDF"[..], "application/pdf"),
        (&b"\x89PNG\r\n\x1a\n"[..], "image/png"),
        (&b"\xff\xd8\xff"[..], "image/jpeg"),
        (&b"GIF87a"[..], "image/gif"),
        (&b"GIF89a"[..], "image/gif"),
        (&b"PK\x03\x04"[..], "application/zip"),
        (&b"\x1f\x8b\x08"[..], "application/x-gzip"),
        (&b"BM"[..], "image/bmp"),
    ];
    if let Some((_, mime)) = magic.iter().find(|(sig, _)| data.starts_with(sig)) {
        return *mime;
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }

    let text = match std::str::from_utf8(&data[..data.len().min(512)]) {
        Ok(t) => t,
        // A multi-byte character cut at the window edge is still text.
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&data[..e.valid_up_to()]).unwrap_or_default(),
        Err(_) => return OCTET,
    };
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return OCTET;
    }
    let head = text.trim_start();
    let lower = head.get(..head.len().min(16)).unwrap_or(head).to_ascii_lowercase();
    if head.starts_with('{') || head.starts_with('[') {
        "application/json"
    } else if lower.starts_with("<?xml") {
        "application/xml"
    } else if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_and_text_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("a.bin");
        write_binary("AAEC/w==", &bin).unwrap();
        assert_eq!(fs::read(&bin).unwrap(), vec![0, 1, 2, 255]);
        assert_eq!(read_binary(&bin).unwrap(), "AAEC/w==");

        let txt = dir.path().join("a.txt");
        write_text("héllo\n", &txt).unwrap();
        assert_eq!(read_text(&txt).unwrap(), "héllo\n");
        assert!(matches!(read_text(&bin), Err(FileError::NotText(_))));
    }

    #[test]
    fn bad_base64_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        assert!(matches!(write_binary("@@@", &path), Err(FileError::InvalidBase64(_))));
        assert!(!path_exists(&path));
    }

    #[test]
    fn dirs_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        create_dir(&nested).unwrap();
        create_dir(&nested).unwrap();
        assert!(path_exists(&nested));

        write_text("1", dir.path().join("z.txt")).unwrap();
        write_text("2", dir.path().join("m.txt")).unwrap();
        assert_eq!(list_files(dir.path()).unwrap(), vec!["m.txt", "z.txt"]);

        let missing = list_files(dir.path().join("nope")).unwrap_err();
        assert_eq!(missing.code(), -111);
    }

    #[test]
    fn sniffing() {
        assert_eq!(content_type(&STANDARD.encode(b"%PDF-1.7 ...")), "application/pdf");
        assert_eq!(content_type(&STANDARD.encode(b"\x89PNG\r\n\x1a\nrest")), "image/png");
        assert_eq!(content_type(&STANDARD.encode(br#"  {"a": 1}"#)), "application/json");
        assert_eq!(content_type(&STANDARD.encode(b"<?xml version=\"1.0\"?><a/>")), "application/xml");
        assert_eq!(content_type(&STANDARD.encode(b"<!DOCTYPE html><html>")), "text/html; charset=utf-8");
        assert_eq!(content_type(&STANDARD.encode(b"just words")), "text/plain; charset=utf-8");
        assert_eq!(content_type(&STANDARD.encode([0u8, 1, 2, 3])), "application/octet-stream");
        assert_eq!(content_type("not base64"), "application/octet-stream");
    }
}
