// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The warrants directory: one JSON file per condemned session.
//!
//! Files not ending `.warrant.json` are ignored. A missing directory is
//! an empty docket, not an error.

use crate::{atomic_write_json, StorageError};
use gt_core::Warrant;
use std::path::{Path, PathBuf};

/// Handle on the town warrants directory.
#[derive(Debug, Clone)]
pub struct WarrantStore {
    dir: PathBuf,
}

impl WarrantStore {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All warrants on file, pending and executed, in filename order.
    pub fn list(&self) -> Result<Vec<Warrant>, StorageError> {
        let mut warrants = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(warrants),
            Err(e) => return Err(e.into()),
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".warrant.json"))
            })
            .collect();
        paths.sort();
        for path in paths {
            let data = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Warrant>(&data) {
                Ok(warrant) => warrants.push(warrant),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed warrant");
                }
            }
        }
        Ok(warrants)
    }

    /// Warrants awaiting execution.
    pub fn pending(&self) -> Result<Vec<Warrant>, StorageError> {
        Ok(self.list()?.into_iter().filter(|w| !w.executed).collect())
    }

    /// Write a warrant to disk. One warrant per target: filing against
    /// a target with a pending warrant overwrites it, executed evidence
    /// for a different incident is replaced.
    pub fn put(&self, warrant: &Warrant) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(warrant.filename());
        atomic_write_json(&path, warrant)?;
        Ok(path)
    }

    /// Load the warrant for a target, if any.
    pub fn get(&self, target: &str) -> Result<Option<Warrant>, StorageError> {
        let path = self
            .dir
            .join(format!("{}.warrant.json", target.replace('/', "-")));
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}

#[cfg(test)]
#[path = "warrants_tests.rs"]
mod tests;
