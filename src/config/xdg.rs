//! Configuration path resolution.
//!
//! - `$XDG_CONFIG_HOME/apctl/config.toml` when the variable is set
//! - `~/.config/apctl/config.toml` otherwise

use std::ffi::OsString;
use std::path::PathBuf;

const APP_NAME: &str = "apctl";

/// Returns the configuration directory, or `None` when no home directory
/// can be determined.
pub fn config_dir() -> Option<PathBuf> {
    resolve_config_dir(std::env::var_os("XDG_CONFIG_HOME"), dirs::home_dir())
}

/// Returns the path to the default configuration file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

fn resolve_config_dir(xdg: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match xdg {
        Some(xdg) if !xdg.is_empty() => Some(PathBuf::from(xdg).join(APP_NAME)),
        _ => home.map(|home| home.join(".config").join(APP_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_override_wins() {
        let dir = resolve_config_dir(
            Some(OsString::from("/custom/config")),
            Some(PathBuf::from("/home/op")),
        );
        assert_eq!(dir, Some(PathBuf::from("/custom/config/apctl")));
    }

    #[test]
    fn falls_back_to_dot_config() {
        let dir = resolve_config_dir(None, Some(PathBuf::from("/home/op")));
        assert_eq!(dir, Some(PathBuf::from("/home/op/.config/apctl")));
    }

    #[test]
    fn empty_xdg_is_ignored() {
        let dir = resolve_config_dir(Some(OsString::new()), Some(PathBuf::from("/home/op")));
        assert_eq!(dir, Some(PathBuf::from("/home/op/.config/apctl")));
    }

    #[test]
    fn no_home_and_no_xdg() {
        assert_eq!(resolve_config_dir(None, None), None);
    }
}
