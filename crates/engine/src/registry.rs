// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed work registry.
//!
//! Every other component reads and writes beads through this layer;
//! none touches the issue store directly. All calls route by ID prefix
//! through the town's route table, so cross-database operations (an
//! agent bead in a rig DB hooking a town bead, say) always land on the
//! right connection.

use crate::GtError;
use gt_adapters::{BeadsAdapter, CreateOpts, ListFilter, MoleculeStep, UpdatePatch};
use gt_core::bead::LABEL_AGENT;
use gt_core::{Bead, BeadId, BeadStatus, DescFields, MergeRequest};
use gt_storage::RouteTable;
use std::path::PathBuf;

/// Typed wrapper over the issue store, routing by prefix.
#[derive(Clone)]
pub struct Registry<B> {
    routes: RouteTable,
    beads: B,
}

impl<B: BeadsAdapter> Registry<B> {
    pub fn new(routes: RouteTable, beads: B) -> Self {
        Self { routes, beads }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn adapter(&self) -> &B {
        &self.beads
    }

    fn db_for(&self, id: &str) -> Result<PathBuf, GtError> {
        Ok(self.routes.resolve_bead(id)?)
    }

    /// Database directory for a prefix (with or without trailing dash).
    pub fn db_for_prefix(&self, prefix: &str) -> Result<PathBuf, GtError> {
        let dashed = if prefix.ends_with('-') {
            prefix.to_string()
        } else {
            format!("{}-", prefix)
        };
        Ok(self.routes.resolve(&dashed)?)
    }

    pub async fn show(&self, id: &str) -> Result<Bead, GtError> {
        let db = self.db_for(id)?;
        Ok(self.beads.show(&db, id, false).await?)
    }

    /// Existence check tolerant of a syncing replica. Never used before
    /// a mutation.
    pub async fn show_stale(&self, id: &str) -> Result<Bead, GtError> {
        let db = self.db_for(id)?;
        Ok(self.beads.show(&db, id, true).await?)
    }

    pub async fn list(&self, prefix: &str, filter: &ListFilter) -> Result<Vec<Bead>, GtError> {
        let db = self.db_for_prefix(prefix)?;
        Ok(self.beads.list(&db, filter).await?)
    }

    pub async fn create(&self, prefix: &str, opts: &CreateOpts) -> Result<BeadId, GtError> {
        let db = self.db_for_prefix(prefix)?;
        Ok(self.beads.create(&db, opts).await?)
    }

    pub async fn update(&self, id: &str, patch: &UpdatePatch) -> Result<(), GtError> {
        let db = self.db_for(id)?;
        Ok(self.beads.update(&db, id, patch).await?)
    }

    pub async fn close(&self, id: &str, reason: &str) -> Result<(), GtError> {
        let db = self.db_for(id)?;
        Ok(self.beads.close(&db, id, reason).await?)
    }

    /// Open and unblocked beads in one database.
    pub async fn ready(&self, prefix: &str) -> Result<Vec<Bead>, GtError> {
        let db = self.db_for_prefix(prefix)?;
        Ok(self.beads.ready(&db).await?)
    }

    pub async fn list_by_label(&self, prefix: &str, label: &str) -> Result<Vec<Bead>, GtError> {
        self.list(prefix, &ListFilter::label(label)).await
    }

    /// Agent beads across every routed database, town included.
    pub async fn list_agent_beads(&self) -> Result<Vec<Bead>, GtError> {
        let mut seen_dbs = Vec::new();
        let mut agents = Vec::new();
        let mut prefixes: Vec<String> =
            self.routes.routes().iter().map(|r| r.prefix.clone()).collect();
        if !prefixes.iter().any(|p| p == "hq-") {
            prefixes.push("hq-".to_string());
        }
        for prefix in prefixes {
            let db = self.db_for_prefix(&prefix)?;
            if seen_dbs.contains(&db) {
                continue;
            }
            seen_dbs.push(db.clone());
            let mut batch = self.beads.list(&db, &ListFilter::label(LABEL_AGENT)).await?;
            agents.append(&mut batch);
        }
        Ok(agents)
    }

    /// The bead currently hooked to an agent, from the agent bead's slot.
    pub async fn hook_of(&self, agent_bead_id: &str) -> Result<Option<String>, GtError> {
        let db = self.db_for(agent_bead_id)?;
        let slots = self.beads.slot_show(&db, agent_bead_id).await?;
        Ok(slots.hook.filter(|h| !h.is_empty()))
    }

    /// Point an agent bead's hook at `target`.
    ///
    /// The slot write goes to the database owning the *agent bead*. The
    /// hook target may live elsewhere; updating its status is the
    /// caller's step and follows the caller's fatality rules.
    pub async fn set_hook(
        &self,
        agent_bead_id: &str,
        target: Option<&str>,
    ) -> Result<(), GtError> {
        let db = self.db_for(agent_bead_id)?;
        Ok(self
            .beads
            .slot_set(&db, agent_bead_id, "hook", target)
            .await?)
    }

    /// Clear an agent's hook slot and best-effort reopen the hooked bead.
    ///
    /// Failing to update the hook target's status is logged and
    /// non-fatal; failing to clear the agent slot is fatal.
    pub async fn clear_hook(&self, agent_bead_id: &str) -> Result<Option<String>, GtError> {
        let hooked = self.hook_of(agent_bead_id).await?;
        self.set_hook(agent_bead_id, None).await?;
        if let Some(ref bead_id) = hooked {
            let patch = UpdatePatch {
                status: Some(BeadStatus::Open),
                assignee: Some(String::new()),
                description: None,
            };
            if let Err(e) = self.update(bead_id, &patch).await {
                tracing::warn!(bead = %bead_id, error = %e, "hook target status not reopened");
            }
        }
        Ok(hooked)
    }

    /// Recover the agent identity behind an agent bead ID (or session
    /// name; the two share one shape).
    pub fn agent_for_bead_id(&self, id: &str) -> Option<gt_core::AgentId> {
        if id.starts_with("hq-") {
            return gt_core::AgentId::from_session_name(id, "", "");
        }
        let prefix = id.split('-').next()?;
        let rig = self.routes.rig_of(&format!("{}-", prefix))?;
        gt_core::AgentId::from_session_name(id, prefix, &rig)
    }

    /// The merge request bead whose `branch` field matches, if any.
    pub async fn find_mr_for_branch(
        &self,
        prefix: &str,
        branch: &str,
    ) -> Result<Option<Bead>, GtError> {
        let mrs = self
            .list_by_label(prefix, gt_core::bead::LABEL_MERGE_REQUEST)
            .await?;
        Ok(mrs.into_iter().find(|b| {
            MergeRequest::from_bead(b).branch == branch
        }))
    }

    /// Steps of the molecule attached to a bead.
    pub async fn molecule_of(&self, id: &str) -> Result<Vec<MoleculeStep>, GtError> {
        let db = self.db_for(id)?;
        Ok(self.beads.mol_current(&db, id).await?)
    }

    /// Read a structured field off a bead's description.
    pub async fn field_of(&self, id: &str, key: &str) -> Result<Option<String>, GtError> {
        let bead = self.show(id).await?;
        Ok(DescFields::parse(&bead.description)
            .get(key)
            .map(str::to_string))
    }

    /// Set a structured field on a bead's description, preserving
    /// everything else verbatim.
    pub async fn set_field(&self, id: &str, key: &str, value: &str) -> Result<(), GtError> {
        let bead = self.show(id).await?;
        let mut fields = DescFields::parse(&bead.description);
        fields.set(key, value);
        self.update(
            id,
            &UpdatePatch {
                status: None,
                assignee: None,
                description: Some(fields.to_string()),
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
