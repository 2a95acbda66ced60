// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory issue store for testing.
//!
//! Mirrors the `bd` CLI closely enough that tests can assert on the
//! recorded command log (argv + working database) the way an operator
//! would read a trace of real invocations.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    BeadsAdapter, BeadsError, CreateOpts, ListFilter, MoleculeStep, Slots, UpdatePatch,
};
use async_trait::async_trait;
use gt_core::{Bead, BeadId, BeadStatus, BeadType, DescFields};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One recorded `bd` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdInvocation {
    pub db: PathBuf,
    pub argv: Vec<String>,
}

impl BdInvocation {
    /// Whether the argv starts with the given words.
    pub fn starts_with(&self, words: &[&str]) -> bool {
        self.argv.len() >= words.len() && self.argv.iter().zip(words).all(|(a, w)| a == w)
    }
}

#[derive(Default)]
struct FakeBeadsState {
    dbs: HashMap<PathBuf, HashMap<String, Bead>>,
    db_prefixes: HashMap<PathBuf, String>,
    formulas: Vec<String>,
    cooked: Vec<String>,
    molecules: HashMap<String, Vec<MoleculeStep>>,
    log: Vec<BdInvocation>,
    fail_update_ids: Vec<String>,
    prime_text: String,
    next_id: u64,
}

/// Fake issue store adapter for testing
#[derive(Clone, Default)]
pub struct FakeBeads {
    inner: Arc<Mutex<FakeBeadsState>>,
}

impl FakeBeads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a bead directly.
    pub fn insert(&self, db: &Path, bead: Bead) {
        let mut state = self.inner.lock();
        state
            .dbs
            .entry(db.to_path_buf())
            .or_default()
            .insert(bead.id.as_str().to_string(), bead);
    }

    /// Current state of a bead.
    pub fn bead(&self, db: &Path, id: &str) -> Option<Bead> {
        self.inner.lock().dbs.get(db)?.get(id).cloned()
    }

    /// Register a formula name.
    pub fn add_formula(&self, name: &str) {
        self.inner.lock().formulas.push(name.to_string());
    }

    /// ID prefix for beads created in a database (default `gt`).
    pub fn set_db_prefix(&self, db: &Path, prefix: &str) {
        self.inner
            .lock()
            .db_prefixes
            .insert(db.to_path_buf(), prefix.to_string());
    }

    /// Attach molecule steps readable through `mol_current`.
    pub fn set_molecule(&self, bead_id: &str, steps: Vec<MoleculeStep>) {
        self.inner
            .lock()
            .molecules
            .insert(bead_id.to_string(), steps);
    }

    /// Make updates of one bead fail, for partial-failure paths.
    pub fn fail_updates_for(&self, id: &str) {
        self.inner.lock().fail_update_ids.push(id.to_string());
    }

    pub fn set_prime_text(&self, text: &str) {
        self.inner.lock().prime_text = text.to_string();
    }

    /// The recorded invocation log.
    pub fn log(&self) -> Vec<BdInvocation> {
        self.inner.lock().log.clone()
    }

    fn record(state: &mut FakeBeadsState, db: &Path, argv: Vec<String>) {
        state.log.push(BdInvocation {
            db: db.to_path_buf(),
            argv,
        });
    }
}

fn apply_filter(bead: &Bead, filter: &ListFilter) -> bool {
    if let Some(status) = filter.status {
        if bead.status != status {
            return false;
        }
    }
    if let Some(ref assignee) = filter.assignee {
        if &bead.assignee != assignee {
            return false;
        }
    }
    if let Some(ref label) = filter.label {
        if !bead.has_label(label) {
            return false;
        }
    }
    if let Some(bead_type) = filter.bead_type {
        if bead.bead_type != bead_type {
            return false;
        }
    }
    true
}

#[async_trait]
impl BeadsAdapter for FakeBeads {
    async fn show(&self, db: &Path, id: &str, allow_stale: bool) -> Result<Bead, BeadsError> {
        let mut state = self.inner.lock();
        let mut argv = vec!["show".to_string(), id.to_string(), "--json".to_string()];
        if allow_stale {
            argv.push("--allow-stale".to_string());
        }
        Self::record(&mut state, db, argv);
        state
            .dbs
            .get(db)
            .and_then(|beads| beads.get(id))
            .cloned()
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))
    }

    async fn list(&self, db: &Path, filter: &ListFilter) -> Result<Vec<Bead>, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(&mut state, db, vec!["list".to_string(), "--json".to_string()]);
        let mut beads: Vec<Bead> = state
            .dbs
            .get(db)
            .map(|beads| {
                beads
                    .values()
                    .filter(|b| apply_filter(b, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        beads.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(beads)
    }

    async fn create(&self, db: &Path, opts: &CreateOpts) -> Result<BeadId, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "create".to_string(),
                "--type".to_string(),
                opts.bead_type.as_str().to_string(),
                "--title".to_string(),
                opts.title.clone(),
                "--silent".to_string(),
            ],
        );
        state.next_id += 1;
        let prefix = state
            .db_prefixes
            .get(db)
            .cloned()
            .unwrap_or_else(|| "gt".to_string());
        let id = BeadId::new(format!("{}-b{}", prefix, state.next_id));
        let bead = Bead {
            id: id.clone(),
            bead_type: opts.bead_type,
            title: opts.title.clone(),
            description: opts.description.clone(),
            status: BeadStatus::Open,
            assignee: opts.assignee.clone().unwrap_or_default(),
            priority: opts.priority.unwrap_or(2),
            labels: opts.labels.clone(),
            created_at: None,
            closed_at: None,
            ephemeral: opts.ephemeral,
            hook_bead: String::new(),
        };
        state
            .dbs
            .entry(db.to_path_buf())
            .or_default()
            .insert(id.as_str().to_string(), bead);
        Ok(id)
    }

    async fn update(&self, db: &Path, id: &str, patch: &UpdatePatch) -> Result<(), BeadsError> {
        let mut state = self.inner.lock();
        let mut argv = vec!["update".to_string(), id.to_string()];
        if let Some(status) = patch.status {
            argv.push(format!("--status={}", status));
        }
        if let Some(ref assignee) = patch.assignee {
            argv.push(format!("--assignee={}", assignee));
        }
        if let Some(ref description) = patch.description {
            argv.push(format!("--description={}", description));
        }
        Self::record(&mut state, db, argv);

        if state.fail_update_ids.iter().any(|f| f == id) {
            return Err(BeadsError::CommandFailed(format!(
                "injected update failure for {}",
                id
            )));
        }
        let bead = state
            .dbs
            .get_mut(db)
            .and_then(|beads| beads.get_mut(id))
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        if let Some(status) = patch.status {
            bead.status = status;
        }
        if let Some(ref assignee) = patch.assignee {
            bead.assignee = assignee.clone();
        }
        if let Some(ref description) = patch.description {
            bead.description = description.clone();
        }
        Ok(())
    }

    async fn close(&self, db: &Path, id: &str, reason: &str) -> Result<(), BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "close".to_string(),
                id.to_string(),
                "--reason".to_string(),
                reason.to_string(),
            ],
        );
        let bead = state
            .dbs
            .get_mut(db)
            .and_then(|beads| beads.get_mut(id))
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        bead.status = BeadStatus::Closed;
        Ok(())
    }

    async fn ready(&self, db: &Path) -> Result<Vec<Bead>, BeadsError> {
        self.list(db, &ListFilter::status(BeadStatus::Open)).await
    }

    async fn slot_set(
        &self,
        db: &Path,
        agent_bead: &str,
        slot: &str,
        target: Option<&str>,
    ) -> Result<(), BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "slot".to_string(),
                "set".to_string(),
                agent_bead.to_string(),
                format!("{}={}", slot, target.unwrap_or("")),
            ],
        );
        let bead = state
            .dbs
            .get_mut(db)
            .and_then(|beads| beads.get_mut(agent_bead))
            .ok_or_else(|| BeadsError::NotFound(agent_bead.to_string()))?;
        if slot == "hook" {
            bead.hook_bead = target.unwrap_or("").to_string();
        }
        Ok(())
    }

    async fn slot_show(&self, db: &Path, agent_bead: &str) -> Result<Slots, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "slot".to_string(),
                "show".to_string(),
                agent_bead.to_string(),
                "--json".to_string(),
            ],
        );
        let bead = state
            .dbs
            .get(db)
            .and_then(|beads| beads.get(agent_bead))
            .ok_or_else(|| BeadsError::NotFound(agent_bead.to_string()))?;
        Ok(Slots {
            hook: (!bead.hook_bead.is_empty()).then(|| bead.hook_bead.clone()),
            role: None,
        })
    }

    async fn mol_current(&self, db: &Path, id: &str) -> Result<Vec<MoleculeStep>, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "mol".to_string(),
                "current".to_string(),
                id.to_string(),
                "--json".to_string(),
            ],
        );
        Ok(state.molecules.get(id).cloned().unwrap_or_default())
    }

    async fn mol_wisp(
        &self,
        db: &Path,
        formula: &str,
        vars: &[(String, String)],
    ) -> Result<BeadId, BeadsError> {
        let mut state = self.inner.lock();
        let mut argv = vec!["mol".to_string(), "wisp".to_string(), formula.to_string()];
        for (key, value) in vars {
            argv.push("--var".to_string());
            argv.push(format!("{}={}", key, value));
        }
        Self::record(&mut state, db, argv);

        if !state.cooked.iter().any(|c| c == formula) {
            return Err(BeadsError::CommandFailed(format!(
                "formula {} not cooked",
                formula
            )));
        }
        state.next_id += 1;
        let prefix = state
            .db_prefixes
            .get(db)
            .cloned()
            .unwrap_or_else(|| "gt".to_string());
        let id = BeadId::new(format!("{}-wisp{}", prefix, state.next_id));
        let mut fields = DescFields::default();
        fields.set("formula", formula);
        let bead = Bead {
            id: id.clone(),
            bead_type: BeadType::Wisp,
            title: format!("wisp of {}", formula),
            description: fields.to_string(),
            status: BeadStatus::Open,
            assignee: String::new(),
            priority: 2,
            labels: Vec::new(),
            created_at: None,
            closed_at: None,
            ephemeral: true,
            hook_bead: String::new(),
        };
        state
            .dbs
            .entry(db.to_path_buf())
            .or_default()
            .insert(id.as_str().to_string(), bead);
        Ok(id)
    }

    async fn mol_bond(&self, db: &Path, wisp: &str, target: &str) -> Result<(), BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec![
                "mol".to_string(),
                "bond".to_string(),
                wisp.to_string(),
                target.to_string(),
            ],
        );
        let db_beads = state
            .dbs
            .get(db)
            .ok_or_else(|| BeadsError::NotFound(wisp.to_string()))?;
        if !db_beads.contains_key(wisp) {
            return Err(BeadsError::NotFound(wisp.to_string()));
        }
        Ok(())
    }

    async fn formula_exists(&self, db: &Path, name: &str) -> Result<bool, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec!["formula".to_string(), "show".to_string(), name.to_string()],
        );
        Ok(state.formulas.iter().any(|f| f == name))
    }

    async fn cook(&self, db: &Path, formula: &str) -> Result<(), BeadsError> {
        let mut state = self.inner.lock();
        Self::record(
            &mut state,
            db,
            vec!["cook".to_string(), formula.to_string()],
        );
        if !state.formulas.iter().any(|f| f == formula) {
            return Err(BeadsError::NotFound(formula.to_string()));
        }
        let owned = formula.to_string();
        if !state.cooked.contains(&owned) {
            state.cooked.push(owned);
        }
        Ok(())
    }

    async fn prime_output(&self, db: &Path) -> Result<String, BeadsError> {
        let mut state = self.inner.lock();
        Self::record(&mut state, db, vec!["prime".to_string()]);
        Ok(state.prime_text.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
