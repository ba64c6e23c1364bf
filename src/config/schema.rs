//! TOML configuration schema.
//!
//! Every section and field has a default via `#[serde(default)]`, so an
//! empty file is valid. Durations are human-readable strings (`"5s"`,
//! `"500ms"`) parsed with `humantime` in [`Config::resolve`].
//!
//! ```toml
//! [control]
//! ctrl_dir = "/var/run/hostapd"
//! interface = "wlan0"
//! request_timeout = "10s"
//! local_dir = "/tmp"
//!
//! [keepalive]
//! interval = "5s"
//! probe_timeout = "2s"
//! reconnect_delay = "1s"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_LOCAL_DIR;
use crate::config::error::ConfigError;
use crate::{ClientConfig, DEFAULT_CTRL_DIR};

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the daemon lives and how long to wait for it.
    pub control: ControlConfig,
    /// Liveness probing and reconnection.
    pub keepalive: KeepaliveConfig,
}

/// `[control]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    /// Directory holding the daemon's control sockets.
    pub ctrl_dir: PathBuf,
    /// Interface to use; the first one found in `ctrl_dir` when unset.
    pub interface: Option<String>,
    /// Reply timeout for ordinary commands.
    pub request_timeout: String,
    /// Directory for the client's local reply socket.
    pub local_dir: PathBuf,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            ctrl_dir: PathBuf::from(DEFAULT_CTRL_DIR),
            interface: None,
            request_timeout: "10s".to_string(),
            local_dir: PathBuf::from(DEFAULT_LOCAL_DIR),
        }
    }
}

/// `[keepalive]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Time between keepalive ticks.
    pub interval: String,
    /// Reply timeout for the `PING` probe.
    pub probe_timeout: String,
    /// Delay between attempts while first connecting.
    pub reconnect_delay: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval: "5s".to_string(),
            probe_timeout: "2s".to_string(),
            reconnect_delay: "1s".to_string(),
        }
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
        message,
    };
    let duration = humantime::parse_duration(value).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}

impl Config {
    /// Validates the durations and produces client settings.
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            ctrl_dir: self.control.ctrl_dir.clone(),
            interface: self.control.interface.clone(),
            local_dir: self.control.local_dir.clone(),
            request_timeout: parse_duration(
                "control.request_timeout",
                &self.control.request_timeout,
            )?,
            ping_interval: parse_duration("keepalive.interval", &self.keepalive.interval)?,
            probe_timeout: parse_duration(
                "keepalive.probe_timeout",
                &self.keepalive.probe_timeout,
            )?,
            reconnect_delay: parse_duration(
                "keepalive.reconnect_delay",
                &self.keepalive.reconnect_delay,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_client_defaults() {
        let resolved = Config::default().resolve().unwrap();
        assert_eq!(resolved, ClientConfig::default());
    }

    #[test]
    fn durations_accept_humantime_strings() {
        let mut config = Config::default();
        config.keepalive.interval = "1m 30s".to_string();
        config.keepalive.probe_timeout = "250ms".to_string();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.ping_interval, Duration::from_secs(90));
        assert_eq!(resolved.probe_timeout, Duration::from_millis(250));
    }

    #[test]
    fn invalid_duration_names_field() {
        let mut config = Config::default();
        config.control.request_timeout = "soon".to_string();
        match config.resolve().unwrap_err() {
            ConfigError::InvalidDuration { field, value, .. } => {
                assert_eq!(field, "control.request_timeout");
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidDuration, got: {other:?}"),
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = Config::default();
        config.keepalive.interval = "0s".to_string();
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidDuration {
                field: "keepalive.interval",
                ..
            })
        ));
    }
}
