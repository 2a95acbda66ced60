// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent roles.
//!
//! Roles are a closed set. Everything downstream of identity resolution
//! works with this enum; no stringly-typed role detection survives past
//! [`crate::agent::AgentId`] parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role an agent plays in the town.
///
/// Town-level roles (mayor, deacon, boot, dog) have no rig. Witness and
/// refinery are per-rig singletons. Crew and polecats are named workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Town singleton: the human operator's seat.
    Mayor,
    /// Town singleton: the supervising daemon.
    Deacon,
    /// The deacon's watched child process.
    Boot,
    /// A town-level pool worker (`deacon/dogs/<name>`).
    Dog,
    /// Rig singleton overseeing polecats.
    Witness,
    /// Rig singleton draining the merge queue.
    Refinery,
    /// Persistent named worker bound to a worktree.
    Crew,
    /// Ephemeral autonomous worker.
    Polecat,
}

impl Role {
    /// The canonical lowercase name used in agent IDs and session names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mayor => "mayor",
            Role::Deacon => "deacon",
            Role::Boot => "boot",
            Role::Dog => "dog",
            Role::Witness => "witness",
            Role::Refinery => "refinery",
            Role::Crew => "crew",
            Role::Polecat => "polecat",
        }
    }

    /// The path segment this role uses in agent IDs (`crew`, `polecats`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            Role::Polecat => "polecats",
            Role::Dog => "dogs",
            other => other.as_str(),
        }
    }

    /// Parse a role from its ID path segment. Accepts both the singular
    /// role name and the plural path segment for polecats and dogs.
    pub fn from_segment(s: &str) -> Option<Role> {
        match s {
            "mayor" => Some(Role::Mayor),
            "deacon" => Some(Role::Deacon),
            "boot" => Some(Role::Boot),
            "dog" | "dogs" => Some(Role::Dog),
            "witness" => Some(Role::Witness),
            "refinery" => Some(Role::Refinery),
            "crew" => Some(Role::Crew),
            "polecat" | "polecats" => Some(Role::Polecat),
            _ => None,
        }
    }

    /// Town-level roles have no rig.
    pub fn is_town_level(&self) -> bool {
        matches!(self, Role::Mayor | Role::Deacon | Role::Boot | Role::Dog)
    }

    /// Witness and refinery exist exactly once per rig.
    pub fn is_rig_singleton(&self) -> bool {
        matches!(self, Role::Witness | Role::Refinery)
    }

    /// Crew, polecats and dogs carry an individual name.
    pub fn requires_name(&self) -> bool {
        matches!(self, Role::Crew | Role::Polecat | Role::Dog)
    }

    /// Roles whose prime must hold an identity lock (worker roles that
    /// must not run twice on one machine).
    pub fn needs_identity_lock(&self) -> bool {
        matches!(self, Role::Crew | Role::Polecat | Role::Witness | Role::Refinery)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
