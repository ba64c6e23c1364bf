//! Control interface discovery.
//!
//! The daemon creates one control socket per interface inside its control
//! directory, so the directory listing is the list of reachable interfaces.

use std::io;
use std::path::Path;

/// Returns the entry names in `ctrl_dir`, sorted by name.
///
/// Hidden entries (leading `.`) and names that are not valid UTF-8 are
/// skipped.
pub fn list_interfaces(ctrl_dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(ctrl_dir)? {
        let entry = entry?;
        match entry.file_name().into_string() {
            Ok(name) if !name.starts_with('.') => names.push(name),
            Ok(_) => {}
            Err(raw) => tracing::debug!(name = ?raw, "skipping non UTF-8 entry"),
        }
    }
    names.sort();
    Ok(names)
}

/// Returns the first interface in `ctrl_dir`, if any.
///
/// An unreadable directory counts as empty.
pub fn first_interface(ctrl_dir: &Path) -> Option<String> {
    match list_interfaces(ctrl_dir) {
        Ok(names) => names.into_iter().next(),
        Err(e) => {
            tracing::debug!(dir = %ctrl_dir.display(), error = %e, "cannot list control directory");
            None
        }
    }
}
