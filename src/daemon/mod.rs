//! Process lifecycle: daemonization, pid file and shutdown signals.
//!
//! Daemonization forks, so it has to happen before the Tokio runtime is
//! built; forking a process that already runs a runtime corrupts its signal
//! handling state.

pub mod pidfile;

pub use pidfile::PidFile;

use fork::{daemon, Fork};
use std::io;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If the SIGTERM handler cannot be registered only SIGINT is awaited.
pub async fn wait_for_shutdown() {
    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(e) => {
            tracing::warn!(error = %e, "cannot register SIGTERM handler");
            None
        }
    };

    let terminate = async {
        match sigterm.as_mut() {
            Some(sigterm) => {
                sigterm.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("received SIGINT, shutting down"),
            Err(e) => tracing::warn!(error = %e, "SIGINT handler failed, shutting down"),
        },
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// Daemonize the current process.
///
/// The parent exits with status 0; the child continues detached from the
/// terminal.
///
/// * `nochdir` - keep the working directory instead of changing to `/`.
/// * `noclose` - keep stdin/stdout/stderr instead of redirecting them to
///   `/dev/null`.
///
/// Must be called before the Tokio runtime is started.
pub fn daemonize_process(nochdir: bool, noclose: bool) -> io::Result<()> {
    match daemon(nochdir, noclose) {
        Ok(Fork::Child) => Ok(()),
        Ok(Fork::Parent(_)) => std::process::exit(0),
        Err(e) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to daemonize: {}", e),
        )),
    }
}
