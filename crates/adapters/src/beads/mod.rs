// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue store adapters.
//!
//! The issue store is a foreign process (`bd`) with JSON output and one
//! database directory per rig plus the town database. Every call names
//! the database it runs against; routing lives in the engine's registry,
//! not here.

mod cli;

pub use cli::BdCli;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BdInvocation, FakeBeads};

use async_trait::async_trait;
use gt_core::{Bead, BeadId, BeadStatus, BeadType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from issue store operations
#[derive(Debug, Error)]
pub enum BeadsError {
    #[error("bead not found: {0}")]
    NotFound(String),
    #[error("bd command failed: {0}")]
    CommandFailed(String),
    #[error("bd output decode failed: {0}")]
    Decode(String),
}

/// Filter for `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<BeadStatus>,
    pub assignee: Option<String>,
    pub label: Option<String>,
    pub bead_type: Option<BeadType>,
    /// `Some(-1)` lists all priorities, matching the bd convention.
    pub priority: Option<i64>,
}

impl ListFilter {
    pub fn status(status: BeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }
}

/// Options for `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOpts {
    pub bead_type: BeadType,
    pub title: String,
    pub description: String,
    pub priority: Option<i64>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub ephemeral: bool,
}

/// Partial update for `update`. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePatch {
    pub status: Option<BeadStatus>,
    pub assignee: Option<String>,
    pub description: Option<String>,
}

impl UpdatePatch {
    pub fn status(status: BeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee.is_none() && self.description.is_none()
    }
}

/// Slot state of an agent bead, from `bd slot show --json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One step of a molecule, from `bd mol current --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoleculeStep {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Adapter over the issue store CLI.
#[async_trait]
pub trait BeadsAdapter: Clone + Send + Sync + 'static {
    /// Read one bead. `allow_stale` tolerates a syncing replica and is
    /// only for existence checks, never before mutation.
    async fn show(&self, db: &Path, id: &str, allow_stale: bool) -> Result<Bead, BeadsError>;

    async fn list(&self, db: &Path, filter: &ListFilter) -> Result<Vec<Bead>, BeadsError>;

    async fn create(&self, db: &Path, opts: &CreateOpts) -> Result<BeadId, BeadsError>;

    async fn update(&self, db: &Path, id: &str, patch: &UpdatePatch) -> Result<(), BeadsError>;

    async fn close(&self, db: &Path, id: &str, reason: &str) -> Result<(), BeadsError>;

    /// Open and unblocked beads.
    async fn ready(&self, db: &Path) -> Result<Vec<Bead>, BeadsError>;

    /// Set or clear a slot on an agent bead (`hook=<id>` / `hook=`).
    async fn slot_set(
        &self,
        db: &Path,
        agent_bead: &str,
        slot: &str,
        target: Option<&str>,
    ) -> Result<(), BeadsError>;

    async fn slot_show(&self, db: &Path, agent_bead: &str) -> Result<Slots, BeadsError>;

    /// The current molecule attached to a bead, oldest step first.
    async fn mol_current(&self, db: &Path, id: &str) -> Result<Vec<MoleculeStep>, BeadsError>;

    /// Materialize a wisp epic from a cooked formula. Returns the wisp ID.
    async fn mol_wisp(
        &self,
        db: &Path,
        formula: &str,
        vars: &[(String, String)],
    ) -> Result<BeadId, BeadsError>;

    /// Bond a wisp onto a target bead.
    async fn mol_bond(&self, db: &Path, wisp: &str, target: &str) -> Result<(), BeadsError>;

    /// Whether a formula is registered.
    async fn formula_exists(&self, db: &Path, name: &str) -> Result<bool, BeadsError>;

    /// Cook a formula so its wisps can be materialized.
    async fn cook(&self, db: &Path, formula: &str) -> Result<(), BeadsError>;

    /// `bd prime` output for folding into a context prime.
    async fn prime_output(&self, db: &Path) -> Result<String, BeadsError>;
}
