// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town root discovery and the filesystem layout the core owns.
//!
//! A town is marked by `mayor/town.json` (primary) or a bare `mayor/`
//! directory (secondary). Discovery walks up from the working directory;
//! `GT_TOWN_ROOT` (or legacy `GT_ROOT`) is the fallback when walking
//! fails, e.g. for sessions spawned outside the town tree.

use crate::StorageError;
use gt_core::{AgentId, Role};
use std::path::{Path, PathBuf};

/// Handle on a discovered town root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Town {
    root: PathBuf,
}

impl Town {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` looking for a town marker.
    pub fn discover(start: &Path) -> Result<Self, StorageError> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            if is_town_root(d) {
                return Ok(Self::at(d));
            }
            dir = d.parent();
        }
        if let Some(root) = env_root() {
            if is_town_root(&root) {
                return Ok(Self::at(root));
            }
        }
        Err(StorageError::NoTown(start.to_path_buf()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn routes_path(&self) -> PathBuf {
        self.root.join(".beads").join("routes.jsonl")
    }

    pub fn rigs_path(&self) -> PathBuf {
        self.root.join("mayor").join("rigs.json")
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.root.join("mayor").join("accounts.json")
    }

    pub fn quota_state_path(&self) -> PathBuf {
        self.root.join(".beads").join("quota-state.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join(".events.jsonl")
    }

    pub fn warrants_dir(&self) -> PathBuf {
        self.root.join("warrants")
    }

    pub fn rig_dir(&self, rig: &str) -> PathBuf {
        self.root.join(rig)
    }

    pub fn rig_settings_path(&self, rig: &str) -> PathBuf {
        self.rig_dir(rig).join("settings").join("config.json")
    }

    /// Canonical home directory for an agent. Always the modern layout;
    /// use [`Town::existing_home`] when reading state that may predate it.
    pub fn home(&self, agent: &AgentId) -> PathBuf {
        match agent.role {
            Role::Mayor => self.root.join("mayor"),
            Role::Deacon | Role::Boot => self.root.join("deacon"),
            Role::Dog => self.root.join("deacon").join("dogs").join(&agent.name),
            Role::Witness => self.rig_dir(&agent.rig).join("witness").join("rig"),
            Role::Refinery => self.rig_dir(&agent.rig).join("refinery").join("rig"),
            Role::Crew => self.rig_dir(&agent.rig).join("crew").join(&agent.name),
            // Nested form: <rig>/polecats/<name>/<rig>
            Role::Polecat => self
                .rig_dir(&agent.rig)
                .join("polecats")
                .join(&agent.name)
                .join(&agent.rig),
        }
    }

    /// The agent's home as it exists on disk, accepting the legacy flat
    /// polecat layout (`<rig>/polecats/<name>`) on read.
    pub fn existing_home(&self, agent: &AgentId) -> PathBuf {
        let canonical = self.home(agent);
        if canonical.exists() || agent.role != Role::Polecat {
            return canonical;
        }
        let legacy = self
            .rig_dir(&agent.rig)
            .join("polecats")
            .join(&agent.name);
        if legacy.join(".runtime").exists() || legacy.join(".git").exists() {
            legacy
        } else {
            canonical
        }
    }

    /// `.runtime` state directory under an agent home.
    pub fn runtime_dir(home: &Path) -> PathBuf {
        home.join(".runtime")
    }

    pub fn lock_path(home: &Path) -> PathBuf {
        Self::runtime_dir(home).join("agent.lock")
    }

    pub fn session_id_path(home: &Path) -> PathBuf {
        Self::runtime_dir(home).join("session_id")
    }

    pub fn handoff_marker_path(home: &Path) -> PathBuf {
        Self::runtime_dir(home).join("handoff.marker")
    }

    pub fn deacon_log_path(&self) -> PathBuf {
        self.root.join("deacon").join(".runtime").join("deacon.log")
    }

    pub fn deacon_pid_path(&self) -> PathBuf {
        self.root.join("deacon").join(".runtime").join("deacon.pid")
    }
}

fn is_town_root(dir: &Path) -> bool {
    let mayor = dir.join("mayor");
    mayor.join("town.json").is_file() || mayor.is_dir()
}

fn env_root() -> Option<PathBuf> {
    std::env::var_os("GT_TOWN_ROOT")
        .or_else(|| std::env::var_os("GT_ROOT"))
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "town_tests.rs"]
mod tests;
