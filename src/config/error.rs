//! Configuration error types for loading and parsing TOML config files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("Invalid configuration at {path}:{line}:{column}: {message}")]
    ParseError {
        /// Path to the file containing the error.
        path: PathBuf,
        /// One-based line index of the error (0 if unknown).
        line: usize,
        /// One-based column index of the error (0 if unknown).
        column: usize,
        /// Human-readable description of the parse failure.
        message: String,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// Path that was requested but does not exist.
        path: PathBuf,
    },

    /// A duration setting is not a valid, non-zero duration.
    #[error("Invalid duration for '{field}': '{value}' ({message})")]
    InvalidDuration {
        /// Dotted setting name, e.g. `keepalive.interval`.
        field: &'static str,
        /// Value as written.
        value: String,
        /// Why it was rejected.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_read_error() {
        let err = ConfigError::ReadError {
            path: PathBuf::from("/etc/apctl/config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/apctl/config.toml"));
        assert!(msg.contains("Failed to read"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("config.toml"),
            line: 5,
            column: 12,
            message: "expected `=`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("5:12"), "ParseError should include line:column");
        assert!(msg.contains("expected `=`"));
    }

    #[test]
    fn display_not_found_error() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("/missing/config.toml"),
        };
        assert!(err.to_string().contains("/missing/config.toml"));
    }

    #[test]
    fn display_invalid_duration() {
        let err = ConfigError::InvalidDuration {
            field: "keepalive.interval",
            value: "soon".to_string(),
            message: "expected number at 0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("keepalive.interval"));
        assert!(msg.contains("'soon'"));
    }
}
