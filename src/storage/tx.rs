//! Transactional file primitives: the project lock and atomic writes.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SkillError};

// =============================================================================
// PROJECT LOCK
// =============================================================================

/// Advisory lock serializing runs that write the lockfile or vendor tree.
///
/// Released when dropped. A second run fails fast with
/// [`SkillError::LockHeld`] instead of waiting.
#[derive(Debug)]
pub struct ProjectLock {
    lock_file: File,
    lock_path: PathBuf,
}

impl ProjectLock {
    const LOCK_FILENAME: &'static str = "run.lock";

    /// Acquire the lock without blocking.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let lock_path = state_dir.join(Self::LOCK_FILENAME);
        fs::create_dir_all(state_dir)?;

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                let holder = Self::status(state_dir)
                    .ok()
                    .flatten()
                    .map_or_else(|| "unknown process".to_string(), |h| h.to_string());
                return Err(SkillError::LockHeld {
                    path: lock_path,
                    holder,
                });
            }
            Err(err) => return Err(SkillError::Io(err)),
        }

        let holder = LockHolder::current();
        let holder_json = serde_json::to_vec(&holder)?;
        lock_file.set_len(0)?;
        lock_file.seek(SeekFrom::Start(0))?;
        lock_file.write_all(&holder_json)?;
        lock_file.flush()?;

        debug!(path = %lock_path.display(), "acquired project lock");
        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    /// Who holds (or last held) the lock, if recorded.
    pub fn status(state_dir: &Path) -> Result<Option<LockHolder>> {
        let lock_path = state_dir.join(Self::LOCK_FILENAME);
        if !lock_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&lock_path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&content).ok())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(err) = self.lock_file.set_len(0) {
            debug!("failed to clear lock holder: {err}");
        }
        if let Err(err) = FileExt::unlock(&self.lock_file) {
            debug!("failed to release project lock: {err}");
        }
        debug!(path = %self.lock_path.display(), "released project lock");
    }
}

/// Information about the current lock holder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub hostname: String,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

impl fmt::Display for LockHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid {} on {} since {}",
            self.pid,
            self.hostname,
            self.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

// =============================================================================
// ATOMIC WRITES
// =============================================================================

/// Replace `path` with `bytes` so readers see either the old or the new
/// content, never a partial file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| SkillError::ValidationFailed(format!("not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let write_result = (|| -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();
    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(SkillError::Io(err));
    }

    fs::rename(&temp_path, path).map_err(|err| {
        // Clean up temp file on rename failure
        let _ = fs::remove_file(&temp_path);
        SkillError::Io(err)
    })
}
