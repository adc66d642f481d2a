//! SFTP counterpart of the FTP operations.
//!
//! libssh2 is blocking, so every operation runs on tokio's blocking pool
//! with its own SSH session. The session is disconnected when the handle
//! drops, whichever way the operation exits.
//!
//! The server host key is not checked. Password authentication only.

use crate::ftp::error::{TransferError, TransferErrorKind, TransferResult};
use crate::ftp::target::ConnectionTarget;
use crate::ftp::types::TransferConfig;
use ssh2::{Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};

const DIR_MODE: i32 = 0o755;

/// One SSH connection plus its file-transfer subsystem.
struct SftpHandle {
    session: Session,
    sftp: Option<Sftp>,
}

impl SftpHandle {
    fn open(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<Self> {
        let addr = format!("{}:{}", target.host, target.port);
        log::debug!("SFTP connecting to {}", addr);

        let tcp = dial(target, config)?;

        let mut session = Session::new()
            .map_err(|e| TransferError::sftp_connection(format!("failed to create SSH session: {}", e)))?;
        session.set_timeout(u32::try_from(config.io_timeout().as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| TransferError::sftp_connection(format!("SSH handshake with {} failed: {}", addr, e)))?;

        session
            .userauth_password(&target.username, &target.password)
            .map_err(|e| TransferError::sftp_connection(format!("authentication failed: {}", e)))?;
        if !session.authenticated() {
            return Err(TransferError::sftp_connection(
                "authentication failed: not authenticated after password attempt",
            ));
        }

        let sftp = session
            .sftp()
            .map_err(|e| TransferError::sftp_client(format!("failed to open SFTP subsystem: {}", e)))?;
        log::debug!("SFTP session ready on {}", addr);

        Ok(Self {
            session,
            sftp: Some(sftp),
        })
    }

    fn sftp(&self) -> TransferResult<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| TransferError::sftp_client("SFTP subsystem already closed"))
    }
}

impl Drop for SftpHandle {
    fn drop(&mut self) {
        drop(self.sftp.take());
        if let Err(e) = self.session.disconnect(None, "closing", None) {
            log::warn!("SSH disconnect failed: {}", e);
        }
    }
}

/// What sits at a remote path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Missing,
}

/// The few remote calls the directory and store logic needs.
trait RemoteFs {
    fn kind(&self, path: &Path) -> EntryKind;
    fn mkdir(&self, path: &Path) -> TransferResult<()>;
    fn write_file(&self, path: &Path, data: &[u8]) -> TransferResult<()>;
}

impl RemoteFs for Sftp {
    fn kind(&self, path: &Path) -> EntryKind {
        match self.stat(path) {
            Ok(stat) if stat.is_dir() => EntryKind::Dir,
            Ok(_) => EntryKind::File,
            Err(_) => EntryKind::Missing,
        }
    }

    fn mkdir(&self, path: &Path) -> TransferResult<()> {
        Sftp::mkdir(self, path, DIR_MODE)
            .map_err(|e| TransferError::sftp_operation(format!("mkdir '{}' failed: {}", path.display(), e)))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> TransferResult<()> {
        let mut file = self.create(path).map_err(|e| {
            TransferError::sftp_operation(format!("create '{}' failed: {}", path.display(), e))
        })?;
        file.write_all(data)
            .map_err(|e| TransferError::sftp_operation(format!("write '{}' failed: {}", path.display(), e)))
    }
}

/// Every prefix of `path` that names a directory to ensure, outermost
/// first. The root and empty prefixes are left out.
fn dir_chain(path: &Path) -> Vec<PathBuf> {
    let mut current = PathBuf::new();
    let mut chain = Vec::new();
    for component in path.components() {
        current.push(component);
        if current.as_os_str().is_empty() || current == Path::new("/") {
            continue;
        }
        chain.push(current.clone());
    }
    chain
}

/// `mkdir -p`: existing directories are skipped, a file anywhere on the
/// chain is a conflict.
fn ensure_dirs<F: RemoteFs + ?Sized>(fs: &F, path: &Path) -> TransferResult<()> {
    for dir in dir_chain(path) {
        match fs.kind(&dir) {
            EntryKind::Dir => continue,
            EntryKind::File => return Err(TransferError::file_conflict(&dir.to_string_lossy())),
            EntryKind::Missing => fs.mkdir(&dir)?,
        }
    }
    Ok(())
}

/// Create the parents, then the file.
fn store_file<F: RemoteFs + ?Sized>(fs: &F, path: &Path, data: &[u8]) -> TransferResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dirs(fs, parent)?;
    }
    fs.write_file(path, data)
}

/// Read at most `cap` bytes; nothing at all is an error.
fn read_capped<R: Read>(reader: R, cap: u64, path: &Path) -> TransferResult<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take(cap)
        .read_to_end(&mut buf)
        .map_err(|e| TransferError::sftp_operation(format!("read '{}' failed: {}", path.display(), e)))?;
    if buf.is_empty() {
        return Err(TransferError::empty_transfer(&path.to_string_lossy()));
    }
    Ok(buf)
}

fn dial(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<TcpStream> {
    let addrs = target
        .addr()
        .to_socket_addrs()
        .map_err(|e| TransferError::sftp_connection(format!("cannot resolve {}: {}", target.host, e)))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => last_err = Some(e),
        }
    }
    Err(TransferError::sftp_connection(match last_err {
        Some(e) => format!("TCP connection to {}:{} failed: {}", target.host, target.port, e),
        None => format!("{} resolved to no addresses", target.host),
    }))
}

/// Run a blocking SFTP operation on its own session.
async fn with_handle<T, F>(target: &ConnectionTarget, config: &TransferConfig, op: F) -> TransferResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SftpHandle, &Path) -> TransferResult<T> + Send + 'static,
{
    let target = target.clone();
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let handle = SftpHandle::open(&target, &config)?;
        op(&handle, Path::new(&target.path))
    })
    .await
    .map_err(|e| TransferError::sftp_operation(format!("SFTP task failed: {}", e)))?
}

/// Download a file, capped at `max_transfer_bytes`.
pub async fn fetch(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<Vec<u8>> {
    let cap = config.max_transfer_bytes;
    with_handle(target, config, move |h, path| {
        let file = h.sftp()?.open(path).map_err(|e| {
            TransferError::sftp_operation(format!("open '{}' failed: {}", path.display(), e))
        })?;
        read_capped(file, cap, path)
    })
    .await
}

/// Upload a file, creating missing parent directories first.
pub async fn store(target: &ConnectionTarget, config: &TransferConfig, data: Vec<u8>) -> TransferResult<()> {
    with_handle(target, config, move |h, path| {
        store_file(h.sftp()?, path, &data)?;
        log::debug!("SFTP stored {} bytes to {}", data.len(), path.display());
        Ok(())
    })
    .await
}

/// `mkdir -p`; an existing directory is success, an existing file is a conflict.
pub async fn make_dir(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<()> {
    with_handle(target, config, |h, path| ensure_dirs(h.sftp()?, path)).await
}

/// Entry names of a directory.
pub async fn list(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<Vec<String>> {
    with_handle(target, config, |h, path| {
        let entries = h.sftp()?.readdir(path).map_err(|e| {
            TransferError::new(
                TransferErrorKind::SftpOperation,
                format!("readdir '{}' failed: {}", path.display(), e),
            )
        })?;
        Ok(entries
            .into_iter()
            .filter_map(|(p, _)| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| n != "." && n != "..")
            .collect())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory remote tree that records the calls made against it.
    #[derive(Default)]
    struct FakeFs {
        entries: RefCell<BTreeMap<PathBuf, EntryKind>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFs {
        fn with(entries: &[(&str, EntryKind)]) -> Self {
            let fs = Self::default();
            for (p, k) in entries {
                fs.entries.borrow_mut().insert(PathBuf::from(p), *k);
            }
            fs
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl RemoteFs for FakeFs {
        fn kind(&self, path: &Path) -> EntryKind {
            self.entries.borrow().get(path).copied().unwrap_or(EntryKind::Missing)
        }

        fn mkdir(&self, path: &Path) -> TransferResult<()> {
            self.calls.borrow_mut().push(format!("mkdir {}", path.display()));
            self.entries.borrow_mut().insert(path.to_path_buf(), EntryKind::Dir);
            Ok(())
        }

        fn write_file(&self, path: &Path, data: &[u8]) -> TransferResult<()> {
            self.calls.borrow_mut().push(format!("write {} ({} bytes)", path.display(), data.len()));
            self.entries.borrow_mut().insert(path.to_path_buf(), EntryKind::File);
            Ok(())
        }
    }

    #[test]
    fn chain_skips_root() {
        assert_eq!(
            dir_chain(Path::new("/a/b/c")),
            vec![PathBuf::from("/a"), PathBuf::from("/a/b"), PathBuf::from("/a/b/c")]
        );
        assert_eq!(dir_chain(Path::new("rel/x")), vec![PathBuf::from("rel"), PathBuf::from("rel/x")]);
        assert!(dir_chain(Path::new("/")).is_empty());
    }

    #[test]
    fn existing_directory_is_success() {
        let fs = FakeFs::with(&[("/a", EntryKind::Dir), ("/a/b", EntryKind::Dir)]);
        ensure_dirs(&fs, Path::new("/a/b")).unwrap();
        assert!(fs.calls().is_empty());
    }

    #[test]
    fn missing_components_are_created_in_order() {
        let fs = FakeFs::with(&[("/a", EntryKind::Dir)]);
        ensure_dirs(&fs, Path::new("/a/b/c")).unwrap();
        assert_eq!(fs.calls(), vec!["mkdir /a/b", "mkdir /a/b/c"]);
    }

    #[test]
    fn file_on_the_path_conflicts() {
        let fs = FakeFs::with(&[("/a", EntryKind::Dir), ("/a/b", EntryKind::File)]);
        let err = ensure_dirs(&fs, Path::new("/a/b")).unwrap_err();
        assert_eq!(err.kind, TransferErrorKind::FileConflict);

        let err = ensure_dirs(&fs, Path::new("/a/b/c")).unwrap_err();
        assert_eq!(err.kind, TransferErrorKind::FileConflict);
        assert!(fs.calls().is_empty());
    }

    #[test]
    fn store_creates_parents_first() {
        let fs = FakeFs::default();
        store_file(&fs, Path::new("/up/day/report.csv"), b"1,2").unwrap();
        assert_eq!(
            fs.calls(),
            vec!["mkdir /up", "mkdir /up/day", "write /up/day/report.csv (3 bytes)"]
        );
    }

    #[test]
    fn capped_read() {
        let data = read_capped(&b"abcdef"[..], 4, Path::new("/f")).unwrap();
        assert_eq!(data, b"abcd");
        let err = read_capped(&b""[..], 4, Path::new("/f")).unwrap_err();
        assert_eq!(err.kind, TransferErrorKind::EmptyTransfer);
    }
}
