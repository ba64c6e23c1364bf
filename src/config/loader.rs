//! Configuration file loader with position-aware error reporting.
//!
//! Loads TOML configuration from a specific path or the default location.
//! When the default location has no file, returns `Config::default()`.

use std::fs;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::schema::Config;
use crate::config::xdg;

/// Stateless configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a specific path.
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist, or
    /// `ConfigError::ReadError` for other I/O failures.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse_toml(&content, path)
    }

    /// Load configuration from the default location, falling back to
    /// defaults when there is no file there.
    pub fn load_default() -> Result<Config, ConfigError> {
        match xdg::config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            Some(path) => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Ok(Config::default())
            }
            None => {
                tracing::debug!("No home directory, using default configuration");
                Ok(Config::default())
            }
        }
    }

    /// Load `path` when given, the default location otherwise.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_default(),
        }
    }

    /// Parse a TOML string into `Config` with position-aware error reporting.
    fn parse_toml(content: &str, path: &Path) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| {
                    let before = &content[..span.start];
                    let line = before.matches('\n').count() + 1;
                    let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
                    (line, span.start - line_start + 1)
                })
                .unwrap_or((0, 0));
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line,
                column,
                message: e.message().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serialize tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Run a closure with `XDG_CONFIG_HOME` temporarily set, then restore.
    fn with_xdg_config<F: FnOnce()>(value: &Path, f: F) {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", value);
        f();
        match original {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[control]
ctrl_dir = "/run/hostapd"
interface = "wlan1"
request_timeout = "3s"

[keepalive]
interval = "10s"
"#;
        let config = ConfigLoader::parse_toml(toml_str, Path::new("full.toml"))
            .expect("valid TOML should parse");
        assert_eq!(config.control.ctrl_dir, PathBuf::from("/run/hostapd"));
        assert_eq!(config.control.interface.as_deref(), Some("wlan1"));
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.request_timeout, Duration::from_secs(3));
        assert_eq!(resolved.ping_interval, Duration::from_secs(10));
        assert_eq!(resolved.probe_timeout, Duration::from_secs(2));
    }

    #[test]
    fn parse_empty_string_returns_defaults() {
        let config = ConfigLoader::parse_toml("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_invalid_toml_reports_position() {
        let toml_str = "[control]\nctrl_dir = \n";
        let err = ConfigLoader::parse_toml(toml_str, Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::ParseError {
                path,
                line,
                column,
                message,
            } => {
                assert_eq!(path, PathBuf::from("bad.toml"));
                assert!(line >= 2, "error is past the section header");
                assert!(column > 0);
                assert!(!message.is_empty());
            }
            other => panic!("expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn parse_wrong_type_is_parse_error() {
        let toml_str = "[keepalive]\ninterval = 5\n";
        let err = ConfigLoader::parse_toml(toml_str, Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn load_from_path_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(&file, "[control]\nlocal_dir = \"/run/apctl\"\n").unwrap();
        let config = ConfigLoader::load_from_path(&file).unwrap();
        assert_eq!(config.control.local_dir, PathBuf::from("/run/apctl"));
    }

    #[test]
    fn load_from_path_missing_file_returns_not_found() {
        let path = PathBuf::from("/tmp/nonexistent_apctl_test_config.toml");
        match ConfigLoader::load(Some(&path)).unwrap_err() {
            ConfigError::NotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn load_from_path_directory_returns_read_error() {
        let dir = tempfile::tempdir().unwrap();
        match ConfigLoader::load_from_path(dir.path()).unwrap_err() {
            ConfigError::ReadError { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected ReadError, got: {other:?}"),
        }
    }

    #[test]
    fn load_default_with_no_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        with_xdg_config(dir.path(), || {
            assert_eq!(ConfigLoader::load(None).unwrap(), Config::default());
        });
    }

    #[test]
    fn load_default_with_existing_file_parses_it() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("apctl");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[keepalive]\nreconnect_delay = \"3s\"\n",
        )
        .unwrap();
        with_xdg_config(dir.path(), || {
            let config = ConfigLoader::load_default().unwrap();
            assert_eq!(config.keepalive.reconnect_delay, "3s");
        });
    }
}
