// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker identity locks.
//!
//! A worker's home directory holds `.runtime/agent.lock` naming the
//! process that owns the identity. A second prime attempt on the same
//! machine fails with a diagnostic naming the holder. Locks from dead
//! processes are stale and silently replaced.

use crate::{StorageError, Town};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of an identity lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub session_id: String,
    pub acquired_at: chrono::DateTime<chrono::Utc>,
}

/// An acquired identity lock. Releasing is explicit; handoff leaves the
/// lock for the successor to replace as stale.
#[derive(Debug)]
pub struct IdentityLock {
    path: PathBuf,
}

impl IdentityLock {
    /// Acquire the lock for `home` on behalf of the current process.
    pub fn acquire(
        home: &Path,
        session_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, StorageError> {
        Self::acquire_as(home, std::process::id(), session_id, now)
    }

    /// Acquire the lock for `home`, recording `pid` as the holder (the
    /// agent process, not necessarily this one). Fails with
    /// [`StorageError::LockHeld`] when a different live process owns it.
    pub fn acquire_as(
        home: &Path,
        pid: u32,
        session_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, StorageError> {
        let path = Town::lock_path(home);
        if let Some(holder) = Self::read_holder(&path)? {
            if holder.pid != pid && pid_alive(holder.pid) {
                return Err(StorageError::LockHeld {
                    pid: holder.pid,
                    session_id: holder.session_id,
                    acquired_at: holder.acquired_at.to_rfc3339(),
                });
            }
            tracing::debug!(path = %path.display(), stale_pid = holder.pid, "replacing stale identity lock");
        }
        let holder = LockHolder {
            pid,
            session_id: session_id.to_string(),
            acquired_at: now,
        };
        crate::atomic_write_json(&path, &holder)?;
        Ok(Self { path })
    }

    /// Read the current holder without acquiring.
    pub fn read_holder(path: &Path) -> Result<Option<LockHolder>, StorageError> {
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        match serde_json::from_str(&data) {
            Ok(holder) => Ok(Some(holder)),
            // A torn write is treated as stale
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable identity lock");
                Ok(None)
            }
        }
    }

    /// Whether the lock at `path` belongs to a process that no longer runs.
    pub fn is_stale(path: &Path) -> Result<bool, StorageError> {
        match Self::read_holder(path)? {
            Some(holder) => Ok(!pid_alive(holder.pid)),
            None => Ok(path.is_file()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file.
    pub fn release(self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Best-effort liveness probe for a pid on this machine.
pub fn pid_alive(pid: u32) -> bool {
    if Path::new("/proc").is_dir() {
        return Path::new(&format!("/proc/{}", pid)).exists();
    }
    // Platforms without procfs: `kill -0` without sending a signal
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
