//! Error types for the control client.
//!
//! Errors are split by where they are handled: [`ConnectError`] and
//! [`RequestError`] come from the control channel, [`CommandError`] from local
//! command resolution and formatting, and [`SessionError`] collects all three
//! for callers that dispatch a full command line.

use std::path::PathBuf;
use thiserror::Error;

/// The control channel to a daemon could not be opened.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// No interface was selected and none could be discovered.
    #[error("No control interface found in {dir}")]
    NoInterface {
        /// Directory that was scanned for control sockets.
        dir: PathBuf,
    },

    /// The local socket could not be created or bound.
    #[error("Failed to create local socket {path}")]
    Bind {
        /// Local socket path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The daemon's control socket refused the connection or does not exist.
    #[error("Failed to connect to {path}")]
    Connect {
        /// Daemon control socket path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A request/reply exchange on an open channel failed.
#[derive(Error, Debug)]
pub enum RequestError {
    /// There is no open channel to send on.
    #[error("Not connected to daemon - command dropped.")]
    NotConnected,

    /// No reply arrived within the allotted time.
    #[error("'{command}' command timed out.")]
    Timeout {
        /// Command that was sent.
        command: String,
    },

    /// Low-level I/O failure while sending or receiving.
    #[error("'{command}' command failed.")]
    Transport {
        /// Command that was sent.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The daemon answered with the `FAIL` sentinel.
    #[error("'{command}' command rejected by daemon")]
    Rejected {
        /// Command that was sent.
        command: String,
        /// Full reply text, starting with `FAIL`.
        reply: String,
    },

    /// The reply did not fit into the reply buffer.
    #[error("'{command}' reply exceeds {max} bytes")]
    ReplyTooLarge {
        /// Command that was sent.
        command: String,
        /// Reply buffer capacity.
        max: usize,
    },

    /// The daemon answered, but not with what the command expects.
    #[error("'{command}' got unexpected reply: {reply}")]
    Unexpected {
        /// Command that was sent.
        command: String,
        /// Reply text, trimmed.
        reply: String,
    },
}

impl RequestError {
    /// Returns true when the failure says nothing about the link itself.
    ///
    /// A rejected, unexpected or oversized reply still proves the daemon is
    /// reachable.
    pub fn is_daemon_reply(&self) -> bool {
        matches!(
            self,
            RequestError::Rejected { .. }
                | RequestError::Unexpected { .. }
                | RequestError::ReplyTooLarge { .. }
        )
    }
}

/// Local command-line validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// The token is a prefix of several command names.
    #[error("Ambiguous command '{token}'; possible commands: {}", candidates.join(" "))]
    Ambiguous {
        /// Token as typed.
        token: String,
        /// Matching names in registration order.
        candidates: Vec<&'static str>,
    },

    /// The token matches no command name.
    #[error("Unknown command '{token}'")]
    Unknown {
        /// Token as typed.
        token: String,
    },

    /// The command was found but its arguments are wrong.
    #[error("Invalid '{command}' command - {reason}")]
    InvalidArguments {
        /// Resolved command name.
        command: &'static str,
        /// What was expected.
        reason: String,
    },

    /// The formatted protocol command does not fit the command buffer.
    #[error("Too long {command} command ({len} bytes, at most {max}).")]
    TooLong {
        /// Protocol verb, e.g. `SET`.
        command: String,
        /// Length of the formatted command.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// A command with this name is already registered.
    #[error("Command '{name}' is already registered")]
    Duplicate {
        /// Name that clashed.
        name: &'static str,
    },
}

/// Anything that can go wrong while dispatching one command line.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Local resolution or validation failed; nothing was sent.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The daemon exchange failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Switching interfaces could not open a channel.
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_ambiguous_lists_candidates() {
        let err = CommandError::Ambiguous {
            token: "wps".to_string(),
            candidates: vec!["wps_pin", "wps_pbc"],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous command 'wps'; possible commands: wps_pin wps_pbc"
        );
    }

    #[test]
    fn display_unknown() {
        let err = CommandError::Unknown {
            token: "frobnicate".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown command 'frobnicate'");
    }

    #[test]
    fn display_timeout_names_command() {
        let err = RequestError::Timeout {
            command: "MIB".to_string(),
        };
        assert_eq!(err.to_string(), "'MIB' command timed out.");
    }

    #[test]
    fn transport_error_chains_source() {
        let err = RequestError::Transport {
            command: "PING".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn connect_error_chains_source() {
        let err = ConnectError::Connect {
            path: PathBuf::from("/var/run/hostapd/wlan0"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/var/run/hostapd/wlan0"));
        assert!(err.source().is_some());
    }

    #[test]
    fn daemon_replies_are_not_link_failures() {
        let rejected = RequestError::Rejected {
            command: "PING".to_string(),
            reply: "FAIL\n".to_string(),
        };
        let timeout = RequestError::Timeout {
            command: "PING".to_string(),
        };
        let oversized = RequestError::ReplyTooLarge {
            command: "MIB".to_string(),
            max: 4096,
        };
        assert!(rejected.is_daemon_reply());
        assert!(oversized.is_daemon_reply());
        assert!(!timeout.is_daemon_reply());
        assert!(!RequestError::NotConnected.is_daemon_reply());
    }

    #[test]
    fn session_error_is_transparent() {
        let err: SessionError = CommandError::Unknown {
            token: "x".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unknown command 'x'");
    }
}
