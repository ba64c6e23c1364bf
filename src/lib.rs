//! apctl library
//!
//! This crate provides the control-channel session engine for talking to an
//! access point daemon over its local control interface: the datagram
//! control channel, command resolution, station enumeration, and the session
//! that ties them together with keepalive and reconnection.
//!
//! # Platform Support
//!
//! This crate supports **Unix-like systems only** (Linux, macOS).
//!
//! Unix-specific features used:
//! - Unix datagram sockets for the control channel
//! - `fork()` for running the action monitor in the background
//! - Unix signal handling (SIGTERM, SIGINT)

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Control channel, datagram transport and station enumeration.
pub mod client;

/// Command registry, tokenizer and the built-in command table.
pub mod commands;

/// Configuration file loading.
pub mod config;

/// Process lifecycle: daemonization, pid file and shutdown signals.
pub mod daemon;

/// Listing of control interfaces in a directory.
pub mod discovery;

/// Error types.
pub mod error;

/// Logging initialization.
pub mod logging;

/// Session state machine and the interactive, batch and action loops.
pub mod session;

pub use client::{ControlChannel, Reply, UnixConnector};
pub use commands::{Action, CommandRegistry, Resolution};
pub use error::{CommandError, ConnectError, RequestError, SessionError};
pub use session::{LinkState, Session};

/// Default directory holding the daemon's control sockets.
pub const DEFAULT_CTRL_DIR: &str = "/var/run/hostapd";

/// Identifies one daemon control socket: a base directory plus an interface name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    ctrl_dir: PathBuf,
    interface: String,
}

impl Endpoint {
    /// Creates an endpoint for `interface` inside `ctrl_dir`.
    pub fn new(ctrl_dir: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            ctrl_dir: ctrl_dir.into(),
            interface: interface.into(),
        }
    }

    /// Returns the control directory.
    pub fn ctrl_dir(&self) -> &Path {
        &self.ctrl_dir
    }

    /// Returns the interface name.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Returns the daemon's control socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.ctrl_dir.join(&self.interface)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.socket_path().display())
    }
}

/// Resolved client settings.
///
/// Built from built-in defaults, then the configuration file, then
/// command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory holding the daemon's control sockets.
    pub ctrl_dir: PathBuf,
    /// Interface to connect to; `None` selects the first one discovered.
    pub interface: Option<String>,
    /// Directory where the client binds its local reply socket.
    pub local_dir: PathBuf,
    /// Timeout for ordinary requests.
    pub request_timeout: Duration,
    /// Interval between keepalive ticks.
    pub ping_interval: Duration,
    /// Timeout for the keepalive probe.
    pub probe_timeout: Duration,
    /// Delay between initial connection attempts.
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    /// Creates a config with default timings for the given directory and interface.
    pub fn new(ctrl_dir: PathBuf, interface: Option<String>) -> Self {
        Self {
            ctrl_dir,
            interface,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ctrl_dir: PathBuf::from(DEFAULT_CTRL_DIR),
            interface: None,
            local_dir: PathBuf::from(client::DEFAULT_LOCAL_DIR),
            request_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}
