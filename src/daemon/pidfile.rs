//! PID file written after daemonizing and removed on orderly shutdown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A written PID file; dropping it removes the file.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Writes the current process id to `path`, replacing any previous file.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::create_with_pid(path.into(), std::process::id())
    }

    fn create_with_pid(path: PathBuf, pid: u32) -> io::Result<Self> {
        fs::write(&path, format!("{}\n", pid))?;
        tracing::debug!(path = %path.display(), pid, "pid file written");
        Ok(Self { path })
    }

    /// Returns the file's location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "removing pid file failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_pid_and_removes_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apctl.pid");

        let pid_file = PidFile::create(&path).unwrap();
        let content = fs::read_to_string(pid_file.path()).unwrap();
        assert_eq!(content, format!("{}\n", std::process::id()));

        drop(pid_file);
        assert!(!path.exists());
    }

    #[test]
    fn replaces_stale_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apctl.pid");
        fs::write(&path, "99999\n").unwrap();

        let _pid_file = PidFile::create_with_pid(path.clone(), 42).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "42\n");
    }

    #[test]
    fn unwritable_location_fails() {
        assert!(PidFile::create("/nonexistent/apctl/apctl.pid").is_err());
    }

    #[test]
    fn already_removed_file_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apctl.pid");
        let pid_file = PidFile::create(&path).unwrap();
        fs::remove_file(&path).unwrap();
        drop(pid_file);
    }
}
