//! State directory resolution and atomic file writes.
//!
//! Everything durable (LKG store, run lock, status history, published
//! snapshots) lives under one state directory so a single env var moves
//! the whole installation. Tests get a thread-local override to avoid
//! process-global env races.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// Thread-local override used only in tests to avoid process-global env races.
thread_local! {
    static THREAD_STATE_DIR: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

/// Resolve the state directory: thread-local test override, then
/// `PARKDAILY_STATE_DIR`, then `.parkdaily` in the working directory.
pub fn state_dir() -> PathBuf {
    if let Some(tl) = THREAD_STATE_DIR.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("PARKDAILY_STATE_DIR") {
        return PathBuf::from(p);
    }
    PathBuf::from(".parkdaily")
}

/// Path of the LKG cache backing store.
pub fn lkg_cache_path() -> PathBuf {
    state_dir().join("lkg_cache.redb")
}

/// Path of the run lock file (content: decimal PID of the holder).
pub fn lock_path() -> PathBuf {
    state_dir().join("parkdaily.lock")
}

/// Path of the rolling status history file.
pub fn status_history_path() -> PathBuf {
    state_dir().join("status.json")
}

/// Directory where published snapshots land.
pub fn output_dir() -> PathBuf {
    state_dir().join("server")
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir_all(path: &Path) -> Result<(), io::Error> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write a file atomically using a temporary file and atomic rename.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), io::Error> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no parent directory"))?;
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
    ));

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Set a thread-local override for the state directory during tests.
#[cfg(any(test, feature = "test-utils"))]
pub fn set_thread_state_dir_for_tests(path: PathBuf) {
    THREAD_STATE_DIR.with(|tl| *tl.borrow_mut() = Some(path));
}

/// Set up an isolated state directory for testing.
///
/// Avoids process-global environment changes by using thread-local state.
#[cfg(test)]
pub fn with_isolated_state_dir() -> tempfile::TempDir {
    let td = tempfile::TempDir::new().expect("failed to create temp dir");
    set_thread_state_dir_for_tests(td.path().to_path_buf());
    td
}
