//! Datagram transport to a daemon's control socket.
//!
//! The daemon listens on a Unix datagram socket named after the interface
//! it controls (`<ctrl_dir>/<interface>`). Datagram peers need an address of
//! their own for replies to reach them, so every connection binds a unique
//! local socket path and removes it again when dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::net::UnixDatagram;

use crate::error::ConnectError;
use crate::Endpoint;

/// Default directory for the client's local socket.
pub const DEFAULT_LOCAL_DIR: &str = "/tmp";

/// Per-process counter so reconnects never reuse a local path.
static LOCAL_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Raw datagram exchange with one daemon.
///
/// The control channel layers the request/reply and event protocol on top of
/// this; implementations only move whole datagrams.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends one datagram.
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()>;

    /// Waits for the next datagram and copies it into `buf`.
    ///
    /// Returns the number of bytes copied; longer datagrams are truncated
    /// to `buf.len()`. Must be cancel safe.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns the next datagram if one is already queued, without waiting.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// Opens transports to endpoints.
///
/// The session reconnects through this, so tests can substitute scripted
/// transports for real sockets.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Establishes a transport to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Transport, ConnectError>;
}

/// Connector for Unix datagram control sockets.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    /// Directory where local reply sockets are created.
    local_dir: PathBuf,
}

impl UnixConnector {
    /// Creates a connector that binds its local sockets inside `local_dir`.
    pub fn new(local_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
        }
    }

    /// Returns the directory for local sockets.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Picks a fresh local socket path for this process.
    fn next_local_path(&self) -> PathBuf {
        let n = LOCAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.local_dir
            .join(format!("apctl_{}-{}", std::process::id(), n))
    }
}

impl Default for UnixConnector {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_DIR)
    }
}

impl Connector for UnixConnector {
    type Transport = UnixTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<UnixTransport, ConnectError> {
        let local_path = self.next_local_path();
        let remote_path = endpoint.socket_path();

        // A leftover from a crashed run with a recycled pid blocks bind.
        if local_path.exists() {
            tracing::debug!(path = %local_path.display(), "removing stale local socket");
            let _ = std::fs::remove_file(&local_path);
        }

        let socket = UnixDatagram::bind(&local_path).map_err(|source| ConnectError::Bind {
            path: local_path.clone(),
            source,
        })?;

        // From here on the guard owns the path, so a failed connect cleans up.
        let transport = UnixTransport { socket, local_path };

        transport
            .socket
            .connect(&remote_path)
            .map_err(|source| ConnectError::Connect {
                path: remote_path.clone(),
                source,
            })?;

        tracing::debug!(
            local = %transport.local_path.display(),
            remote = %remote_path.display(),
            "control socket connected"
        );
        Ok(transport)
    }
}

/// A connected Unix datagram socket plus the local path it is bound to.
#[derive(Debug)]
pub struct UnixTransport {
    socket: UnixDatagram,
    local_path: PathBuf,
}

impl UnixTransport {
    /// Returns the local socket path replies are delivered to.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

impl Transport for UnixTransport {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(datagram).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram write: {} of {} bytes", sent, datagram.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.socket.try_recv(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for UnixTransport {
    /// Removes the local socket file (best-effort).
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.local_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.local_path.display(),
                    error = %e,
                    "failed to remove local socket"
                );
            }
        }
    }
}
