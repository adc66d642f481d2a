//! Public transfer operations, dispatched on the URL scheme.
//!
//! Each call resolves the URL, opens its own connection, performs one
//! operation and disconnects. The service only carries configuration.

use crate::ftp::error::{TransferError, TransferErrorKind, TransferResult};
use crate::ftp::listing;
use crate::ftp::session::{self, Authenticated, ControlSession};
use crate::ftp::sftp;
use crate::ftp::target::{ConnectionTarget, Scheme};
use crate::ftp::transfer;
use crate::ftp::types::{TransferCommand, TransferConfig, TransferType};
use log::info;

#[derive(Debug, Clone, Default)]
pub struct TransferService {
    config: TransferConfig,
}

impl TransferService {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Download a file as raw bytes.
    pub async fn get_file(&self, url: &str) -> TransferResult<Vec<u8>> {
        let target = ConnectionTarget::parse(url)?;
        info!("get_file {}", target);
        match target.scheme {
            Scheme::Sftp => sftp::fetch(&target, &self.config).await,
            Scheme::Ftp => self.ftp_retrieve(&target, TransferType::Binary).await,
        }
    }

    /// Download a text file; CRLF folded to LF and outer whitespace trimmed.
    pub async fn get_text(&self, url: &str) -> TransferResult<String> {
        let target = ConnectionTarget::parse(url)?;
        info!("get_text {}", target);
        let raw = match target.scheme {
            Scheme::Sftp => sftp::fetch(&target, &self.config).await?,
            Scheme::Ftp => self.ftp_retrieve(&target, TransferType::Ascii).await?,
        };
        Ok(transfer::normalize_download_text(&raw))
    }

    /// Upload raw bytes.
    pub async fn put_file(&self, data: &[u8], url: &str) -> TransferResult<()> {
        if data.is_empty() {
            return Err(TransferError::new(TransferErrorKind::EmptyData, "nothing to upload"));
        }
        let target = ConnectionTarget::parse(url)?;
        info!("put_file {} ({} bytes)", target, data.len());
        match target.scheme {
            Scheme::Sftp => sftp::store(&target, &self.config, data.to_vec()).await,
            Scheme::Ftp => self.ftp_store(&target, TransferType::Binary, data).await,
        }
    }

    /// Upload text with CRLF line endings.
    pub async fn put_text(&self, text: &str, url: &str) -> TransferResult<()> {
        if text.is_empty() {
            return Err(TransferError::new(TransferErrorKind::EmptyData, "nothing to upload"));
        }
        let target = ConnectionTarget::parse(url)?;
        info!("put_text {} ({} chars)", target, text.len());
        let payload = transfer::normalize_upload_text(text);
        match target.scheme {
            Scheme::Sftp => sftp::store(&target, &self.config, payload).await,
            Scheme::Ftp => self.ftp_store(&target, TransferType::Ascii, &payload).await,
        }
    }

    /// Create a directory. Succeeds if it already exists; fails if a file
    /// occupies the name.
    pub async fn create_dir(&self, url: &str) -> TransferResult<()> {
        let target = ConnectionTarget::parse(url)?;
        info!("create_dir {}", target);
        match target.scheme {
            Scheme::Sftp => sftp::make_dir(&target, &self.config).await,
            Scheme::Ftp => {
                let path = target.dir_path()?;
                self.login(&target).await?.make_dir(path).await?.close().await;
                Ok(())
            }
        }
    }

    /// Names of the entries in a directory.
    pub async fn list_files(&self, url: &str) -> TransferResult<Vec<String>> {
        let target = ConnectionTarget::parse(url)?;
        info!("list_files {}", target);
        match target.scheme {
            Scheme::Sftp => sftp::list(&target, &self.config).await,
            Scheme::Ftp => {
                let raw = self
                    .ftp_read(&target, TransferType::Ascii, TransferCommand::List(target.path.clone()))
                    .await?;
                Ok(listing::parse_names(&String::from_utf8_lossy(&raw)))
            }
        }
    }

    // ── FTP flows ────────────────────────────────────────────────────

    async fn login(&self, target: &ConnectionTarget) -> TransferResult<ControlSession<Authenticated>> {
        session::login(target, &self.config).await
    }

    async fn ftp_retrieve(&self, target: &ConnectionTarget, ty: TransferType) -> TransferResult<Vec<u8>> {
        let data = self
            .ftp_read(target, ty, TransferCommand::Retrieve(target.path.clone()))
            .await?;
        transfer::ensure_not_empty(data, &target.path)
    }

    /// TYPE → PASV → command → read data → 226.
    async fn ftp_read(
        &self,
        target: &ConnectionTarget,
        ty: TransferType,
        cmd: TransferCommand,
    ) -> TransferResult<Vec<u8>> {
        let (sent, mut data) = self
            .login(target)
            .await?
            .set_type(ty)
            .await?
            .enter_passive()
            .await?
            .issue(&cmd)
            .await?;
        let bytes = data.read_all().await?;
        sent.confirm(data).await?.close().await;
        log::debug!("{} {} returned {} bytes", cmd.verb(), target.path, bytes.len());
        Ok(bytes)
    }

    /// TYPE → PASV → STOR → write data → 226.
    async fn ftp_store(&self, target: &ConnectionTarget, ty: TransferType, payload: &[u8]) -> TransferResult<()> {
        let (sent, mut data) = self
            .login(target)
            .await?
            .set_type(ty)
            .await?
            .enter_passive()
            .await?
            .issue(&TransferCommand::Store(target.path.clone()))
            .await?;
        data.write_all(payload).await?;
        sent.confirm(data).await?.close().await;
        Ok(())
    }
}
