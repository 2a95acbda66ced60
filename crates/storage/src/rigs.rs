// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The rig registry: `mayor/rigs.json`.
//!
//! Rigs are created by the administrative tooling and never mutated by
//! the core at runtime; this module only reads (and re-serializes for
//! tests and doctor output).

use crate::{atomic_write_json, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeadsConfig {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigEntry {
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub added_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub beads: BeadsConfig,
}

/// `mayor/rigs.json`: `{version, rigs: {name: {git_url, added_at, beads}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigRegistry {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub rigs: BTreeMap<String, RigEntry>,
}

fn default_version() -> u32 {
    1
}

impl Default for RigRegistry {
    fn default() -> Self {
        Self {
            version: 1,
            rigs: BTreeMap::new(),
        }
    }
}

impl RigRegistry {
    /// Load the registry; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        atomic_write_json(path, self)
    }

    /// The short prefix (no dash) registered for a rig.
    pub fn prefix_of(&self, rig: &str) -> Option<&str> {
        self.rigs
            .get(rig)
            .map(|e| e.beads.prefix.trim_end_matches('-'))
            .filter(|p| !p.is_empty())
    }

    /// The rig owning a short prefix.
    pub fn rig_for_prefix(&self, prefix: &str) -> Option<&str> {
        let bare = prefix.trim_end_matches('-');
        self.rigs
            .iter()
            .find(|(_, e)| e.beads.prefix.trim_end_matches('-') == bare)
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rigs.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "rigs_tests.rs"]
mod tests;
