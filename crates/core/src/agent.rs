// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity: the bridge between the three coordinate systems.
//!
//! An agent is addressed three ways: by agent ID (`gastown/crew/maria`),
//! by session name (`gt-gastown-crew-maria`), and by home directory.
//! Session name and bead ID are pure functions of the identity plus the
//! rig's registered prefix; they never encode the agent's current work.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from agent ID parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentIdError {
    #[error("empty agent id")]
    Empty,
    #[error("empty path segment in agent id: {0}")]
    EmptySegment(String),
    #[error("unknown role in agent id: {0}")]
    UnknownRole(String),
    #[error("role {role} requires a name (e.g. {role}/<name>)")]
    MissingName { role: Role },
    #[error("{role} is a singleton and takes no name: {given}")]
    SingletonWithName { role: Role, given: String },
}

/// The logical identity of a worker.
///
/// `rig` is empty for town-level roles; `name` is empty for singletons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    pub role: Role,
    #[serde(default)]
    pub rig: String,
    #[serde(default)]
    pub name: String,
}

impl AgentId {
    pub fn mayor() -> Self {
        Self { role: Role::Mayor, rig: String::new(), name: String::new() }
    }

    pub fn deacon() -> Self {
        Self { role: Role::Deacon, rig: String::new(), name: String::new() }
    }

    pub fn boot() -> Self {
        Self { role: Role::Boot, rig: String::new(), name: String::new() }
    }

    pub fn dog(name: impl Into<String>) -> Self {
        Self { role: Role::Dog, rig: String::new(), name: name.into() }
    }

    pub fn witness(rig: impl Into<String>) -> Self {
        Self { role: Role::Witness, rig: rig.into(), name: String::new() }
    }

    pub fn refinery(rig: impl Into<String>) -> Self {
        Self { role: Role::Refinery, rig: rig.into(), name: String::new() }
    }

    pub fn crew(rig: impl Into<String>, name: impl Into<String>) -> Self {
        Self { role: Role::Crew, rig: rig.into(), name: name.into() }
    }

    pub fn polecat(rig: impl Into<String>, name: impl Into<String>) -> Self {
        Self { role: Role::Polecat, rig: rig.into(), name: name.into() }
    }

    /// Parse a canonical agent ID.
    ///
    /// Accepts bare town roles (`mayor`, `deacon`), compound town roles
    /// (`deacon/boot`, `deacon/dogs/<name>`), and rig-scoped forms
    /// (`<rig>/witness`, `<rig>/crew/<name>`, `<rig>/polecats/<name>`).
    ///
    /// Rejects empty segments, unknown roles, names on singletons, and
    /// missing names on worker roles. Shorthand like `<rig>/<name>` is a
    /// dispatch concern, not a valid agent ID.
    pub fn parse(s: &str) -> Result<Self, AgentIdError> {
        if s.is_empty() {
            return Err(AgentIdError::Empty);
        }
        let segs: Vec<&str> = s.split('/').collect();
        if segs.iter().any(|p| p.is_empty()) {
            return Err(AgentIdError::EmptySegment(s.to_string()));
        }

        match segs.as_slice() {
            [one] => match Role::from_segment(one) {
                Some(role) if role.is_town_level() && !role.requires_name() => {
                    Ok(Self { role, rig: String::new(), name: String::new() })
                }
                Some(role) if role.requires_name() => Err(AgentIdError::MissingName { role }),
                // A bare `witness` has no rig; treat as unknown at this layer.
                _ => Err(AgentIdError::UnknownRole(s.to_string())),
            },
            ["deacon", "boot"] => Ok(Self::boot()),
            ["deacon", "dogs", name] => Ok(Self::dog(*name)),
            [rig, seg] => match Role::from_segment(seg) {
                Some(role) if role.is_rig_singleton() => Ok(Self {
                    role,
                    rig: (*rig).to_string(),
                    name: String::new(),
                }),
                Some(role) if role.requires_name() => Err(AgentIdError::MissingName { role }),
                _ => Err(AgentIdError::UnknownRole(s.to_string())),
            },
            [rig, seg, name] => match Role::from_segment(seg) {
                Some(role) if role.requires_name() && !role.is_town_level() => Ok(Self {
                    role,
                    rig: (*rig).to_string(),
                    name: (*name).to_string(),
                }),
                Some(role) if role.is_rig_singleton() => Err(AgentIdError::SingletonWithName {
                    role,
                    given: s.to_string(),
                }),
                _ => Err(AgentIdError::UnknownRole(s.to_string())),
            },
            _ => Err(AgentIdError::UnknownRole(s.to_string())),
        }
    }

    /// The tmux session name for this agent.
    ///
    /// Town-level agents use `hq-<role>[-<name>]`; rig agents use the
    /// rig's registered short prefix: `<prefix>-<rig>-<role>[-<name>]`.
    /// This is a pure function of identity; it never encodes work.
    pub fn session_name(&self, prefix: &str) -> String {
        if self.role.is_town_level() {
            if self.name.is_empty() {
                format!("hq-{}", self.role)
            } else {
                format!("hq-{}-{}", self.role, self.name)
            }
        } else if self.name.is_empty() {
            format!("{}-{}-{}", prefix, self.rig, self.role)
        } else {
            format!("{}-{}-{}-{}", prefix, self.rig, self.role, self.name)
        }
    }

    /// Deterministic ID of this agent's bead in the issue store.
    ///
    /// Same shape as the session name, which keeps the `hq-` / `<prefix>-`
    /// routing rules identical for both.
    pub fn bead_id(&self, prefix: &str) -> String {
        self.session_name(prefix)
    }

    /// Parse a session name back to an agent ID, given the prefix→rig
    /// mapping the caller resolved. Returns `None` for foreign sessions.
    pub fn from_session_name(session: &str, prefix: &str, rig: &str) -> Option<Self> {
        if let Some(rest) = session.strip_prefix("hq-") {
            let (role_s, name) = match rest.split_once('-') {
                Some((r, n)) => (r, n),
                None => (rest, ""),
            };
            let role = Role::from_segment(role_s)?;
            if !role.is_town_level() {
                return None;
            }
            return Some(Self { role, rig: String::new(), name: name.to_string() });
        }
        let body = session.strip_prefix(&format!("{}-{}-", prefix, rig))?;
        let (role_s, name) = match body.split_once('-') {
            Some((r, n)) => (r, n),
            None => (body, ""),
        };
        let role = Role::from_segment(role_s)?;
        if role.is_town_level() {
            return None;
        }
        Some(Self { role, rig: rig.to_string(), name: name.to_string() })
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Mayor | Role::Deacon => write!(f, "{}", self.role),
            Role::Boot => write!(f, "deacon/boot"),
            Role::Dog => write!(f, "deacon/dogs/{}", self.name),
            Role::Witness | Role::Refinery => write!(f, "{}/{}", self.rig, self.role),
            Role::Crew | Role::Polecat => {
                write!(f, "{}/{}/{}", self.rig, self.role.path_segment(), self.name)
            }
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
