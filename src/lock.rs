//! Single-instance lock backed by a PID file
//!
//! The file holds the decimal PID of the owning process. A file naming a
//! process that no longer exists is stale and may be replaced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::{ChunkpostError, Result};

/// Held PID file. Released on [`release`](PidLock::release) or drop.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    pid: u32,
    released: bool,
}

impl PidLock {
    /// Take the lock, failing if another live process holds it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        Self::acquire_inner(path.as_ref(), false)
    }

    /// Take the lock even if another live process holds it.
    ///
    /// The previous holder is only logged; it is not signalled.
    pub fn acquire_with_takeover(path: impl AsRef<Path>) -> Result<Self> {
        Self::acquire_inner(path.as_ref(), true)
    }

    fn acquire_inner(path: &Path, takeover: bool) -> Result<Self> {
        let pid = std::process::id();

        match read_pid(path)? {
            Some(holder) if holder == pid => {
                debug!(path = %path.display(), "Lock already held by this process");
            }
            Some(holder) if process_alive(holder) => {
                if !takeover {
                    return Err(ChunkpostError::Lock(format!(
                        "{} is held by running process {}",
                        path.display(),
                        holder
                    )));
                }
                warn!(path = %path.display(), previous = holder, "Taking over lock from running process");
            }
            Some(holder) => {
                info!(path = %path.display(), previous = holder, "Replacing stale lock");
            }
            None => {}
        }

        fs::write(path, pid.to_string()).map_err(|e| {
            ChunkpostError::Lock(format!("Cannot write {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), pid, "PID written to lock file");

        Ok(Self {
            path: path.to_path_buf(),
            pid,
            released: false,
        })
    }

    /// Whether `path` names a live process
    pub fn is_held(path: impl AsRef<Path>) -> bool {
        matches!(read_pid(path.as_ref()), Ok(Some(pid)) if process_alive(pid))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Remove the lock file if it still names this process.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        match read_pid(&self.path)? {
            Some(pid) if pid == self.pid => {
                fs::remove_file(&self.path).map_err(|e| {
                    ChunkpostError::Lock(format!("Cannot remove {}: {}", self.path.display(), e))
                })?;
                info!(path = %self.path.display(), "Lock released");
            }
            Some(other) => {
                warn!(path = %self.path.display(), holder = other, "Lock now held by another process, leaving it");
            }
            None => {}
        }
        Ok(())
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!(error = %e, "Failed to release lock");
        }
    }
}

/// Read the PID in `path`. Missing files and unparseable contents are `None`.
fn read_pid(path: &Path) -> Result<Option<u32>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().parse().ok()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ChunkpostError::Lock(format!(
            "Cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// Without a portable liveness probe, any recorded PID counts as live.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}
