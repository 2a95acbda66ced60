// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the runtime.
//!
//! Every failure a user can see prints what was attempted, why it
//! failed, and one actionable remediation.

use thiserror::Error;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum GtError {
    #[error("{what} not found: {id} (check the ID, or give a syncing replica a moment)")]
    NotFound { what: &'static str, id: String },

    #[error("cross-rig mismatch: bead belongs to rig {bead_rig} but target is {target_rig} (pass --force to override)")]
    CrossRig {
        bead_rig: String,
        target_rig: String,
    },

    #[error("identity is locked: {holder} (run `gt doctor --fix` if the holder is dead)")]
    Locked { holder: String },

    #[error("session {0} is a zombie (listed but running no agent); `gt doctor` will warrant it")]
    ZombieSession(String),

    #[error("invalid sling target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("no idle {role} available in {scope}")]
    NoIdleWorker { role: &'static str, scope: String },

    #[error("{0}")]
    PartialFailure(String),

    #[error(transparent)]
    Storage(#[from] gt_storage::StorageError),

    #[error(transparent)]
    Beads(#[from] gt_adapters::BeadsError),

    #[error(transparent)]
    Session(#[from] gt_adapters::SessionError),

    #[error("{0}")]
    Fatal(String),
}

impl GtError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        GtError::NotFound {
            what,
            id: id.into(),
        }
    }
}
