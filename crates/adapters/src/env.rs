// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! Names the variables the core consumes; nothing outside this module
//! reads `std::env` for Gas Town semantics.

/// Authoritative role for the current process.
pub const GT_ROLE: &str = "GT_ROLE";
/// Rig the current process belongs to.
pub const GT_RIG: &str = "GT_RIG";
/// Polecat name, for polecat sessions.
pub const GT_POLECAT: &str = "GT_POLECAT";
/// Crew name, for crew sessions.
pub const GT_CREW: &str = "GT_CREW";
/// Runtime (agent CLI) name.
pub const GT_AGENT: &str = "GT_AGENT";
/// Known agent command basenames, comma separated, for zombie detection.
pub const GT_PROCESS_NAMES: &str = "GT_PROCESS_NAMES";
/// Session identity handed to primes.
pub const GT_SESSION_ID: &str = "GT_SESSION_ID";
/// Town root fallback when CWD discovery fails.
pub const GT_TOWN_ROOT: &str = "GT_TOWN_ROOT";
/// Legacy alias for [`GT_TOWN_ROOT`].
pub const GT_ROOT: &str = "GT_ROOT";
/// Actor identity logged by `bd` on mutations.
pub const BD_ACTOR: &str = "BD_ACTOR";
/// Must be `off` under concurrent dispatch to avoid manifest contention.
pub const BD_DOLT_AUTO_COMMIT: &str = "BD_DOLT_AUTO_COMMIT";
/// Per-account credential config directory.
pub const CLAUDE_CONFIG_DIR: &str = "CLAUDE_CONFIG_DIR";
/// Legacy session ID variable, still accepted on read.
pub const CLAUDE_SESSION_ID: &str = "CLAUDE_SESSION_ID";

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

pub fn role() -> Option<String> {
    non_empty(GT_ROLE)
}

pub fn rig() -> Option<String> {
    non_empty(GT_RIG)
}

pub fn polecat() -> Option<String> {
    non_empty(GT_POLECAT)
}

pub fn crew() -> Option<String> {
    non_empty(GT_CREW)
}

pub fn session_id() -> Option<String> {
    non_empty(GT_SESSION_ID).or_else(|| non_empty(CLAUDE_SESSION_ID))
}

pub fn process_names() -> Vec<String> {
    non_empty(GT_PROCESS_NAMES)
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Whether the current process runs inside the multiplexer.
pub fn inside_tmux() -> bool {
    non_empty("TMUX").is_some()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
