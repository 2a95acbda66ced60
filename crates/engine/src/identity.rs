// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role detection for the current process.
//!
//! The environment (`GT_ROLE` and friends) is authoritative; the working
//! directory is the fallback. When both speak and disagree, the
//! environment wins and the identity is flagged as mismatched so callers
//! can warn without refusing to work.

use gt_core::{AgentId, Role};
use gt_storage::Town;
use std::path::Path;

/// The resolved identity of the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub agent: AgentId,
    /// Environment and CWD disagreed; surfaced as a warning.
    pub mismatch: bool,
}

/// Environment inputs, split out so resolution stays testable.
#[derive(Debug, Clone, Default)]
pub struct EnvIdentity {
    pub role: Option<String>,
    pub rig: Option<String>,
    pub polecat: Option<String>,
    pub crew: Option<String>,
}

impl EnvIdentity {
    /// Snapshot the real process environment.
    pub fn from_process() -> Self {
        Self {
            role: gt_adapters::env::role(),
            rig: gt_adapters::env::rig(),
            polecat: gt_adapters::env::polecat(),
            crew: gt_adapters::env::crew(),
        }
    }

    fn to_agent(&self) -> Option<AgentId> {
        let role = Role::from_segment(self.role.as_deref()?)?;
        let rig = self.rig.clone().unwrap_or_default();
        let name = match role {
            Role::Polecat => self.polecat.clone().unwrap_or_default(),
            Role::Crew => self.crew.clone().unwrap_or_default(),
            Role::Dog => self.polecat.clone().or_else(|| self.crew.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        if role.requires_name() && name.is_empty() {
            return None;
        }
        if !role.is_town_level() && rig.is_empty() {
            return None;
        }
        Some(AgentId { role, rig, name })
    }
}

/// Infer an identity from a working directory under the town root.
///
/// Follows the fixed home layout: `mayor/`, `deacon/`, `<rig>/witness/…`,
/// `<rig>/refinery/…`, `<rig>/crew/<name>/…`, `<rig>/polecats/<name>/…`
/// (both polecat layouts accepted).
pub fn infer_from_cwd(town: &Town, cwd: &Path) -> Option<AgentId> {
    let rel = cwd.strip_prefix(town.root()).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(p) => p.to_str(),
            _ => None,
        })
        .collect();
    match parts.as_slice() {
        ["mayor", ..] => Some(AgentId::mayor()),
        ["deacon", "dogs", name, ..] => Some(AgentId::dog(*name)),
        ["deacon", ..] => Some(AgentId::deacon()),
        [rig, "witness", ..] => Some(AgentId::witness(*rig)),
        [rig, "refinery", ..] => Some(AgentId::refinery(*rig)),
        [rig, "crew", name, ..] => Some(AgentId::crew(*rig, *name)),
        [rig, "polecats", name, ..] => Some(AgentId::polecat(*rig, *name)),
        _ => None,
    }
}

/// Resolve the current identity from environment + CWD.
pub fn resolve_identity(env: &EnvIdentity, town: &Town, cwd: &Path) -> Option<Identity> {
    let from_env = env.to_agent();
    let from_cwd = infer_from_cwd(town, cwd);
    match (from_env, from_cwd) {
        (Some(env_agent), Some(cwd_agent)) => {
            let mismatch = env_agent != cwd_agent;
            Some(Identity {
                agent: env_agent,
                mismatch,
            })
        }
        (Some(agent), None) => Some(Identity {
            agent,
            mismatch: false,
        }),
        (None, Some(agent)) => Some(Identity {
            agent,
            mismatch: false,
        }),
        (None, None) => None,
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
