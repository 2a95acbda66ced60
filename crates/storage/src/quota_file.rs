// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The quota-state file and its lifecycle lock.
//!
//! Rotation holds the lock for a whole scan + plan + execute cycle and
//! saves exactly once at the end, so concurrent cycles cannot interleave
//! their writes.

use crate::{atomic_write_json, StorageError};
use fs2::FileExt;
use gt_core::QuotaState;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Handle on `.beads/quota-state.json`.
#[derive(Debug, Clone)]
pub struct QuotaFile {
    path: PathBuf,
}

/// Held for the duration of one rotation cycle.
///
/// Dropping the guard releases the advisory lock; the lock file itself
/// is left in place.
pub struct QuotaGuard {
    // NOTE(lifetime): held to maintain the exclusive advisory lock
    #[allow(dead_code)]
    lock_file: File,
    path: PathBuf,
    saved: bool,
}

impl QuotaFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Load the state without locking (read-only views).
    pub fn load(&self) -> Result<QuotaState, StorageError> {
        if !self.path.is_file() {
            return Ok(QuotaState::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Acquire the lifecycle lock, failing immediately when another
    /// cycle holds it.
    pub fn lock(&self) -> Result<QuotaGuard, StorageError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_file = File::create(&lock_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StorageError::QuotaLocked)?;
        Ok(QuotaGuard {
            lock_file,
            path: self.path.clone(),
            saved: false,
        })
    }
}

impl QuotaGuard {
    /// Save the state. Guards expect exactly one save per cycle; a
    /// second save is rejected so callers cannot interleave.
    pub fn save(&mut self, state: &QuotaState) -> Result<(), StorageError> {
        if self.saved {
            return Err(StorageError::QuotaLocked);
        }
        atomic_write_json(&self.path, state)?;
        self.saved = true;
        Ok(())
    }

    pub fn saved(&self) -> bool {
        self.saved
    }
}

#[cfg(test)]
#[path = "quota_file_tests.rs"]
mod tests;
