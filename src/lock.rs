//! Process-level run lock with crash recovery.
//!
//! At most one aggregation run may execute at a time on a host. The lock
//! is an OS-level advisory lock on a well-known file whose content is the
//! holder's decimal PID. Crucially, *presence of the file is not evidence
//! of holding*: other processes (the retry-checker) probe the recorded
//! PID for liveness, so a crashed run never permanently blocks future
//! runs even though its lock file may linger.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use fd_lock::RwLock;
use tracing::{info, warn};

use crate::error::LockError;
use crate::paths;

/// Exclusive handle on the run slot. Dropping it releases the OS lock
/// and removes the lock file.
pub struct RunLock {
    path: PathBuf,
    /// Keeping the open file alive keeps the advisory lock held; dropping
    /// it closes the descriptor and releases the lock.
    _lock: Option<RwLock<File>>,
    pid: u32,
}

impl RunLock {
    /// Attempt to take the run slot at the default lock path.
    pub fn acquire() -> Result<Option<Self>, LockError> {
        Self::acquire_at(&paths::lock_path())
    }

    /// Attempt to take an exclusive, non-blocking advisory lock at `path`.
    ///
    /// On success writes the current PID into the file and returns a
    /// handle. On contention returns `None` immediately; contention is
    /// an expected outcome, not an error.
    pub fn acquire_at(path: &Path) -> Result<Option<Self>, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let mut lock = RwLock::new(file);
        {
            let mut guard = match lock.try_write() {
                Ok(guard) => guard,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    warn!(path = %path.display(), "lock held by another process");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(LockError::AcquisitionFailed {
                        reason: format!("failed to lock '{}': {e}", path.display()),
                    })
                }
            };

            guard.set_len(0)?;
            guard.write_all(process::id().to_string().as_bytes())?;
            guard.flush()?;
            guard.sync_all()?;

            // The guard releases the advisory lock on drop; leak it so the
            // lock stays held until this RunLock is dropped and the file
            // handle inside `lock` is closed.
            std::mem::forget(guard);
        }

        info!(pid = process::id(), path = %path.display(), "run lock acquired");
        Ok(Some(Self {
            path: path.to_path_buf(),
            _lock: Some(lock),
            pid: process::id(),
        }))
    }

    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Release the lock and remove the lock file. Also happens on drop.
    pub fn release(mut self) -> Result<(), LockError> {
        self._lock.take();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!("run lock released");
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self._lock.take();
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl std::fmt::Debug for RunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLock")
            .field("path", &self.path)
            .field("pid", &self.pid)
            .finish()
    }
}

/// Whether a live process currently holds the default run lock.
#[must_use]
pub fn is_held() -> bool {
    is_held_at(&paths::lock_path())
}

/// Whether a live process currently holds the lock at `path`.
///
/// For callers that do NOT hold the lock themselves. Reads the recorded
/// PID and probes it for liveness; a missing file, unparseable content,
/// or a dead PID all report NOT held.
#[must_use]
pub fn is_held_at(path: &Path) -> bool {
    match holder_pid(path) {
        Some(pid) => is_process_running(pid),
        None => false,
    }
}

/// The PID recorded in the lock file, if readable.
#[must_use]
pub fn holder_pid(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<u32>().ok()
}

/// Check whether a process with the given PID is still running.
#[must_use]
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // kill(pid, 0) sends no signal but performs the existence check.
        // EPERM means the process exists but we may not signal it.
        let rc = unsafe { libc::kill(pid as i32, 0) };
        if rc == 0 {
            true
        } else {
            matches!(
                io::Error::last_os_error().raw_os_error(),
                Some(code) if code == libc::EPERM
            )
        }
    }

    #[cfg(not(unix))]
    {
        // Liveness probing is unsupported here; report not held so a
        // stale file can never wedge the scheduler.
        let _ = pid;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A PID far above any realistic pid_max (4194304 on Linux).
    const DEAD_PID: u32 = 999_999_999;

    fn temp_lock_path() -> (tempfile::TempDir, PathBuf) {
        let td = tempfile::TempDir::new().unwrap();
        let path = td.path().join("parkdaily.lock");
        (td, path)
    }

    #[test]
    fn acquire_writes_pid_and_blocks_second_acquire() {
        let (_td, path) = temp_lock_path();

        let lock = RunLock::acquire_at(&path).unwrap().unwrap();
        assert_eq!(holder_pid(&path).unwrap(), process::id());

        // Second open file description contends on the advisory lock.
        assert!(RunLock::acquire_at(&path).unwrap().is_none());

        lock.release().unwrap();
        assert!(!path.exists());

        // Reacquirable after release.
        let _lock2 = RunLock::acquire_at(&path).unwrap().unwrap();
    }

    #[test]
    fn drop_removes_lock_file() {
        let (_td, path) = temp_lock_path();
        {
            let _lock = RunLock::acquire_at(&path).unwrap().unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn is_held_true_while_holder_is_alive() {
        let (_td, path) = temp_lock_path();
        let _lock = RunLock::acquire_at(&path).unwrap().unwrap();
        assert!(is_held_at(&path));
    }

    #[test]
    #[cfg(unix)]
    fn stale_lock_file_with_dead_pid_reports_not_held() {
        let (_td, path) = temp_lock_path();
        fs::write(&path, DEAD_PID.to_string()).unwrap();

        // The file exists, but liveness is authoritative.
        assert!(path.exists());
        assert!(!is_held_at(&path));
    }

    #[test]
    fn missing_or_corrupt_lock_file_reports_not_held() {
        let (_td, path) = temp_lock_path();
        assert!(!is_held_at(&path));

        fs::write(&path, "not a pid").unwrap();
        assert!(!is_held_at(&path));
        assert!(holder_pid(&path).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn own_process_is_running() {
        assert!(is_process_running(process::id()));
        assert!(!is_process_running(DEAD_PID));
    }
}
