//! Logging initialization.
//!
//! Diagnostics go to stderr through `tracing`, filtered by the `APCTL_LOG`
//! environment variable. The default is `warn` so that log lines do not mix
//! with replies in interactive use.
//!
//! ```bash
//! APCTL_LOG=debug apctl -i wlan0 ping
//! ```

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "APCTL_LOG";

/// Level used when `APCTL_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Builds the filter from `APCTL_LOG`, falling back to [`DEFAULT_DIRECTIVE`].
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber.
///
/// Must be called once, before any other thread is spawned. A second call
/// is ignored.
pub fn init() {
    let installed = fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_parses() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVE).is_ok());
    }

    #[test]
    fn module_directive_parses() {
        assert!(EnvFilter::try_new("apctl=debug,warn").is_ok());
        assert!(EnvFilter::try_new("apctl::session=trace").is_ok());
    }

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
    }
}
