// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `bd` CLI adapter.
//!
//! Each invocation runs in the owning database's directory with
//! `BD_ACTOR` naming the mutator and `BD_DOLT_AUTO_COMMIT=off` so
//! concurrent dispatch does not contend on the manifest.

use super::{
    BeadsAdapter, BeadsError, CreateOpts, ListFilter, MoleculeStep, Slots, UpdatePatch,
};
use crate::env;
use crate::subprocess::{run_with_timeout, BD_TIMEOUT};
use async_trait::async_trait;
use gt_core::{Bead, BeadId};
use std::path::Path;
use tokio::process::Command;

/// Issue store adapter shelling out to `bd`.
#[derive(Clone)]
pub struct BdCli {
    /// Actor identity recorded on every mutation.
    actor: String,
}

impl BdCli {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    async fn run(&self, db: &Path, args: &[&str]) -> Result<std::process::Output, BeadsError> {
        let mut cmd = Command::new("bd");
        cmd.args(args)
            .current_dir(db)
            .env(env::BD_ACTOR, &self.actor)
            .env(env::BD_DOLT_AUTO_COMMIT, "off");
        tracing::debug!(db = %db.display(), ?args, "bd");
        run_with_timeout(cmd, BD_TIMEOUT, "bd")
            .await
            .map_err(BeadsError::CommandFailed)
    }

    async fn run_ok(&self, db: &Path, args: &[&str]) -> Result<String, BeadsError> {
        let output = self.run(db, args).await?;
        if !output.status.success() {
            return Err(BeadsError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn decode<T: serde::de::DeserializeOwned>(stdout: &str) -> Result<T, BeadsError> {
    serde_json::from_str(stdout.trim()).map_err(|e| BeadsError::Decode(e.to_string()))
}

fn list_args(filter: &ListFilter) -> Vec<String> {
    let mut owned: Vec<String> = vec!["list".into()];
    if let Some(status) = filter.status {
        owned.push(format!("--status={}", status));
    }
    if let Some(ref assignee) = filter.assignee {
        owned.push(format!("--assignee={}", assignee));
    }
    if let Some(ref label) = filter.label {
        owned.push(format!("--label={}", label));
    }
    if let Some(bead_type) = filter.bead_type {
        owned.push(format!("--type={}", bead_type.as_str()));
    }
    if let Some(priority) = filter.priority {
        owned.push(format!("--priority={}", priority));
    }
    owned.push("--json".into());
    owned
}

fn create_args(opts: &CreateOpts) -> Vec<String> {
    let mut owned: Vec<String> = vec![
        "create".into(),
        "--type".into(),
        opts.bead_type.as_str().into(),
        "--title".into(),
        opts.title.clone(),
    ];
    if !opts.description.is_empty() {
        owned.push("--description".into());
        owned.push(opts.description.clone());
    }
    if let Some(priority) = opts.priority {
        owned.push("--priority".into());
        owned.push(priority.to_string());
    }
    if let Some(ref assignee) = opts.assignee {
        owned.push("--assignee".into());
        owned.push(assignee.clone());
    }
    if !opts.labels.is_empty() {
        owned.push("--labels".into());
        owned.push(opts.labels.join(","));
    }
    if opts.ephemeral {
        owned.push("--ephemeral".into());
    }
    // --silent prints only the new ID
    owned.push("--silent".into());
    owned
}

fn update_args(id: &str, patch: &UpdatePatch) -> Vec<String> {
    let mut owned: Vec<String> = vec!["update".into(), id.into()];
    if let Some(status) = patch.status {
        owned.push(format!("--status={}", status));
    }
    if let Some(ref assignee) = patch.assignee {
        owned.push(format!("--assignee={}", assignee));
    }
    if let Some(ref description) = patch.description {
        owned.push(format!("--description={}", description));
    }
    owned
}

#[async_trait]
impl BeadsAdapter for BdCli {
    async fn show(&self, db: &Path, id: &str, allow_stale: bool) -> Result<Bead, BeadsError> {
        let mut args = vec!["show", id, "--json"];
        if allow_stale {
            args.push("--allow-stale");
        }
        let output = self.run(db, &args).await?;
        if !output.status.success() {
            return Err(BeadsError::NotFound(id.to_string()));
        }
        decode(&String::from_utf8_lossy(&output.stdout))
    }

    async fn list(&self, db: &Path, filter: &ListFilter) -> Result<Vec<Bead>, BeadsError> {
        let owned = list_args(filter);
        let args: Vec<&str> = owned.iter().map(String::as_str).collect();
        let stdout = self.run_ok(db, &args).await?;
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(&stdout)
    }

    async fn create(&self, db: &Path, opts: &CreateOpts) -> Result<BeadId, BeadsError> {
        let owned = create_args(opts);
        let args: Vec<&str> = owned.iter().map(String::as_str).collect();
        let stdout = self.run_ok(db, &args).await?;
        let id = stdout.trim();
        if id.is_empty() {
            return Err(BeadsError::Decode("bd create printed no id".into()));
        }
        Ok(BeadId::new(id))
    }

    async fn update(&self, db: &Path, id: &str, patch: &UpdatePatch) -> Result<(), BeadsError> {
        if patch.is_empty() {
            return Ok(());
        }
        let owned = update_args(id, patch);
        let args: Vec<&str> = owned.iter().map(String::as_str).collect();
        self.run_ok(db, &args).await.map(|_| ())
    }

    async fn close(&self, db: &Path, id: &str, reason: &str) -> Result<(), BeadsError> {
        self.run_ok(db, &["close", id, "--reason", reason])
            .await
            .map(|_| ())
    }

    async fn ready(&self, db: &Path) -> Result<Vec<Bead>, BeadsError> {
        let stdout = self.run_ok(db, &["ready", "--json"]).await?;
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(&stdout)
    }

    async fn slot_set(
        &self,
        db: &Path,
        agent_bead: &str,
        slot: &str,
        target: Option<&str>,
    ) -> Result<(), BeadsError> {
        let assignment = format!("{}={}", slot, target.unwrap_or(""));
        self.run_ok(db, &["slot", "set", agent_bead, &assignment])
            .await
            .map(|_| ())
    }

    async fn slot_show(&self, db: &Path, agent_bead: &str) -> Result<Slots, BeadsError> {
        let stdout = self
            .run_ok(db, &["slot", "show", agent_bead, "--json"])
            .await?;
        // Wire shape: {"slots":{"hook":...,"role":...}}
        #[derive(serde::Deserialize)]
        struct Wire {
            #[serde(default)]
            slots: Slots,
        }
        let wire: Wire = decode(&stdout)?;
        Ok(wire.slots)
    }

    async fn mol_current(&self, db: &Path, id: &str) -> Result<Vec<MoleculeStep>, BeadsError> {
        let output = self.run(db, &["mol", "current", id, "--json"]).await?;
        if !output.status.success() {
            // No molecule attached is an empty answer, not a failure
            return Ok(Vec::new());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        decode(&stdout)
    }

    async fn mol_wisp(
        &self,
        db: &Path,
        formula: &str,
        vars: &[(String, String)],
    ) -> Result<BeadId, BeadsError> {
        let mut owned: Vec<String> = vec!["mol".into(), "wisp".into(), formula.into()];
        for (key, value) in vars {
            owned.push("--var".into());
            owned.push(format!("{}={}", key, value));
        }
        let args: Vec<&str> = owned.iter().map(String::as_str).collect();
        let stdout = self.run_ok(db, &args).await?;
        let id = stdout.trim();
        if id.is_empty() {
            return Err(BeadsError::Decode("bd mol wisp printed no id".into()));
        }
        Ok(BeadId::new(id))
    }

    async fn mol_bond(&self, db: &Path, wisp: &str, target: &str) -> Result<(), BeadsError> {
        self.run_ok(db, &["mol", "bond", wisp, target])
            .await
            .map(|_| ())
    }

    async fn formula_exists(&self, db: &Path, name: &str) -> Result<bool, BeadsError> {
        let output = self.run(db, &["formula", "show", name]).await?;
        Ok(output.status.success())
    }

    async fn cook(&self, db: &Path, formula: &str) -> Result<(), BeadsError> {
        self.run_ok(db, &["cook", formula]).await.map(|_| ())
    }

    async fn prime_output(&self, db: &Path) -> Result<String, BeadsError> {
        self.run_ok(db, &["prime"]).await
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
