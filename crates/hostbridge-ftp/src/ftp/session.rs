//! FTP control-session state machine.
//!
//! ```text
//! Connected → Greeted → UserSent → Authenticated → TypeSet → PasvNegotiated
//!           → CommandSent → Confirmed → (closed)
//! Authenticated → make_dir → Confirmed
//! ```
//!
//! Each state is a marker type; every transition consumes the session and
//! returns the next state, so a sequence such as `STOR` before `PASV` does
//! not compile. A failed transition drops the control socket.

use crate::ftp::error::{TransferError, TransferErrorKind, TransferResult};
use crate::ftp::pasv::parse_pasv;
use crate::ftp::protocol::FtpCodec;
use crate::ftp::target::ConnectionTarget;
use crate::ftp::transfer;
use crate::ftp::types::{FtpResponse, TransferCommand, TransferConfig, TransferType};
use std::marker::PhantomData;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::timeout;

pub struct Connected;
pub struct Greeted;
pub struct UserSent;
pub struct Authenticated;
pub struct TypeSet;
pub struct PasvNegotiated;
pub struct CommandSent;
pub struct Confirmed;

/// One control connection, used for exactly one logical operation.
pub struct ControlSession<S> {
    codec: FtpCodec,
    config: TransferConfig,
    /// Dialed in `enter_passive`, handed out by `issue`.
    pending_data: Option<TcpStream>,
    _state: PhantomData<S>,
}

/// The data connection opened after `PASV`, owned by a single transfer.
pub struct DataConnection {
    stream: TcpStream,
    config: TransferConfig,
    truncated: bool,
}

impl DataConnection {
    /// Read the whole payload, capped at `max_transfer_bytes`.
    pub async fn read_all(&mut self) -> TransferResult<Vec<u8>> {
        let capped =
            transfer::read_capped(&mut self.stream, self.config.max_transfer_bytes, self.config.io_timeout()).await?;
        self.truncated = capped.truncated;
        Ok(capped.data)
    }

    /// Send the whole payload and close the write side.
    pub async fn write_all(&mut self, data: &[u8]) -> TransferResult<()> {
        transfer::write_all(&mut self.stream, data, self.config.io_timeout()).await
    }
}

impl<S> ControlSession<S> {
    fn advance<T>(self) -> ControlSession<T> {
        ControlSession {
            codec: self.codec,
            config: self.config,
            pending_data: self.pending_data,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, cmd: &str) -> TransferResult<FtpResponse> {
        self.codec.execute(cmd).await
    }
}

impl ControlSession<Connected> {
    /// Dial the control port.
    pub async fn connect(target: &ConnectionTarget, config: &TransferConfig) -> TransferResult<Self> {
        let addr = format!("{}:{}", target.host, target.port);
        log::debug!("FTP connecting to {}", addr);

        let stream = timeout(config.connect_timeout(), TcpStream::connect(target.addr()))
            .await
            .map_err(|_| {
                TransferError::connection_failed(format!(
                    "connect to {} timed out after {:?}",
                    addr,
                    config.connect_timeout()
                ))
            })?
            .map_err(|e| TransferError::connection_failed(format!("connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true).ok();

        Ok(Self {
            codec: FtpCodec::new(stream, config.io_timeout()),
            config: config.clone(),
            pending_data: None,
            _state: PhantomData,
        })
    }

    /// Read the server banner; anything other than a 2xx greeting fails.
    pub async fn read_greeting(mut self) -> TransferResult<ControlSession<Greeted>> {
        let banner = self
            .codec
            .read_response()
            .await
            .map_err(|e| e.recast(TransferErrorKind::InitialReadFailed))?;
        if !banner.has_prefix("2") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::InitialReadFailed,
                "220",
                banner.code,
                &banner.text(),
            ));
        }
        log::debug!("FTP greeting: {}", banner.text());
        Ok(self.advance())
    }
}

impl ControlSession<Greeted> {
    pub async fn send_user(mut self, user: &str) -> TransferResult<ControlSession<UserSent>> {
        let resp = self.command(&format!("USER {}", user)).await?;
        if !resp.has_prefix("331") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::AuthFailed,
                "331",
                resp.code,
                &resp.text(),
            ));
        }
        Ok(self.advance())
    }
}

impl ControlSession<UserSent> {
    pub async fn send_pass(mut self, pass: &str) -> TransferResult<ControlSession<Authenticated>> {
        let resp = self.command(&format!("PASS {}", pass)).await?;
        if !resp.has_prefix("230") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::AuthFailed,
                "230",
                resp.code,
                &resp.text(),
            ));
        }
        log::debug!("FTP authenticated");
        Ok(self.advance())
    }
}

impl ControlSession<Authenticated> {
    /// `TYPE I` / `TYPE A`. The reply is consumed but not checked.
    pub async fn set_type(mut self, ty: TransferType) -> TransferResult<ControlSession<TypeSet>> {
        let resp = self.command(ty.command()).await?;
        if !resp.has_prefix("200") {
            log::debug!("{} answered {}", ty.command(), resp.code);
        }
        Ok(self.advance())
    }

    /// Create `path` unless it already exists as a directory.
    ///
    /// `SIZE` answering 213 means a file sits at that name. `CWD` answering
    /// 250 means the directory is already there, so we step back out with
    /// `CDUP` and report success.
    pub async fn make_dir(mut self, path: &str) -> TransferResult<ControlSession<Confirmed>> {
        let size = self.command(&format!("SIZE {}", path)).await?;
        if size.has_prefix("213") {
            return Err(TransferError::file_conflict(path).with_reply(size.code));
        }

        let cwd = self.command(&format!("CWD {}", path)).await?;
        if cwd.has_prefix("250") {
            let cdup = self.command("CDUP").await?;
            log::debug!("directory '{}' already exists (CDUP {})", path, cdup.code);
            return Ok(self.advance());
        }

        let mkd = self.command(&format!("MKD {}", path)).await?;
        if !mkd.has_prefix("257") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::MkdirFailed,
                "257",
                mkd.code,
                &mkd.text(),
            ));
        }
        log::debug!("created directory '{}'", path);
        Ok(self.advance())
    }
}

impl ControlSession<TypeSet> {
    /// `PASV`, then dial the advertised address.
    pub async fn enter_passive(mut self) -> TransferResult<ControlSession<PasvNegotiated>> {
        let resp = self.command("PASV").await?;
        if !resp.has_prefix("227") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::MalformedPasvResponse,
                "227",
                resp.code,
                &resp.text(),
            ));
        }
        let addr = SocketAddr::V4(parse_pasv(&resp.text())?);
        log::debug!("PASV data address {}", addr);

        let stream = timeout(self.config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| TransferError::data_channel(format!("PASV data connect to {} timed out", addr)))?
            .map_err(|e| TransferError::data_channel(format!("PASV data connect to {}: {}", addr, e)))?;
        self.pending_data = Some(stream);
        Ok(self.advance())
    }
}

impl ControlSession<PasvNegotiated> {
    /// Send `RETR` / `STOR` / `LIST` and wait for the `150` go-ahead.
    pub async fn issue(
        mut self,
        cmd: &TransferCommand,
    ) -> TransferResult<(ControlSession<CommandSent>, DataConnection)> {
        let resp = self.command(&cmd.to_wire()).await?;
        if !resp.has_prefix("150") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::TransferNotConfirmed,
                "150",
                resp.code,
                &resp.text(),
            ));
        }
        let stream = self
            .pending_data
            .take()
            .ok_or_else(|| TransferError::data_channel("no data connection after PASV"))?;
        let data = DataConnection {
            stream,
            config: self.config.clone(),
            truncated: false,
        };
        Ok((self.advance(), data))
    }
}

impl ControlSession<CommandSent> {
    /// Close the data connection and wait for `226`.
    ///
    /// A download cut at the size cap closes the data socket while the
    /// server is still sending, so most servers answer `426`. In that case
    /// any completion reply (or none) is accepted and the truncated payload
    /// stands.
    pub async fn confirm(mut self, data: DataConnection) -> TransferResult<ControlSession<Confirmed>> {
        let truncated = data.truncated;
        drop(data);
        let resp = match self.codec.read_response().await {
            Ok(resp) => resp,
            Err(e) if truncated => {
                log::debug!("no completion reply after a capped transfer: {}", e);
                return Ok(self.advance());
            }
            Err(e) => return Err(e),
        };
        if truncated && !resp.has_prefix("226") {
            log::debug!("capped transfer aborted by the server with {}", resp.code);
            return Ok(self.advance());
        }
        if !resp.has_prefix("226") {
            return Err(TransferError::unexpected_reply(
                TransferErrorKind::TransferNotConfirmed,
                "226",
                resp.code,
                &resp.text(),
            ));
        }
        Ok(self.advance())
    }
}

impl ControlSession<Confirmed> {
    /// Best-effort `QUIT`; the socket is closed either way.
    pub async fn close(mut self) {
        match self.command("QUIT").await {
            Ok(resp) => log::trace!("QUIT answered {}", resp.code),
            Err(e) => log::warn!("QUIT failed: {}", e),
        }
        self.codec.shutdown().await;
    }
}

/// Connect, greet and log in.
pub async fn login(
    target: &ConnectionTarget,
    config: &TransferConfig,
) -> TransferResult<ControlSession<Authenticated>> {
    ControlSession::connect(target, config)
        .await?
        .read_greeting()
        .await?
        .send_user(&target.username)
        .await?
        .send_pass(&target.password)
        .await
}
