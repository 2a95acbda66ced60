// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch: move work onto an agent's hook and make the agent run.
//!
//! Validation through hook apply is atomic from the user's perspective;
//! a failed slot write rolls the bead back. A failure after the hook is
//! applied leaves the bead hooked, and the next `gt prime` on that agent
//! picks it up.

use crate::registry::Registry;
use crate::supervisor::{session_env, EnsureOutcome, RuntimeConfig, Supervisor};
use crate::GtError;
use gt_adapters::{BeadsAdapter, SessionAdapter, UpdatePatch};
use gt_core::bead::{is_bead_id, LABEL_AGENT};
use gt_core::fields::{FIELD_ATTACHED_MOLECULE, FIELD_CONVOY_ID};
use gt_core::{AgentId, AgentIdError, Bead, BeadStatus, BeadType};
use gt_storage::{EventsLog, StorageError, Town};
use std::path::PathBuf;

/// Options for one sling invocation.
#[derive(Debug, Clone, Default)]
pub struct SlingOptions {
    /// Target agent; `None` hooks the caller itself.
    pub target: Option<String>,
    /// Formula mode: the bead the cooked molecule attaches to.
    pub on: Option<String>,
    /// Override the cross-rig guard.
    pub force: bool,
    /// Skip convoy bookkeeping in formula mode.
    pub no_convoy: bool,
}

/// A validated sling target, before resolution to a concrete agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlingTarget {
    Agent(AgentId),
    /// `rig/name`: crew if a crew directory exists, else polecat.
    Shorthand { rig: String, name: String },
    /// Bare rig name: auto-allocate an idle polecat there.
    BareRig(String),
    /// `deacon/dogs`: dispatch to an idle dog.
    DogsPool,
}

/// Result of a sling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlingOutcome {
    Hooked {
        bead: String,
        agent: String,
        session: String,
        /// `None` when the session came up; the error text otherwise
        /// (the hook stays applied either way).
        session_error: Option<String>,
        spawned: bool,
    },
    /// The agent already holds exactly this bead; nothing was touched.
    AlreadyHooked,
}

/// Parse and validate a sling target string.
///
/// Rejects empty segments, unknown roles, and names on singletons.
/// Accepts bare rig names (auto-spawn) and `rig/name` shorthand.
pub fn parse_target(s: &str, known_rigs: &[String]) -> Result<SlingTarget, GtError> {
    let invalid = |reason: &str| GtError::InvalidTarget {
        target: s.to_string(),
        reason: reason.to_string(),
    };
    if s.is_empty() {
        return Err(invalid("empty target"));
    }
    let segs: Vec<&str> = s.split('/').collect();
    if segs.iter().any(|p| p.is_empty()) {
        return Err(invalid("empty path segment"));
    }
    if s == "deacon/dogs" {
        return Ok(SlingTarget::DogsPool);
    }
    if segs.len() == 1 && known_rigs.iter().any(|r| r == s) {
        return Ok(SlingTarget::BareRig(s.to_string()));
    }
    match AgentId::parse(s) {
        Ok(agent) => Ok(SlingTarget::Agent(agent)),
        Err(AgentIdError::SingletonWithName { role, .. }) => Err(invalid(&format!(
            "{} is a singleton and takes no name",
            role
        ))),
        Err(AgentIdError::MissingName { role }) => {
            Err(invalid(&format!("{} requires a name", role)))
        }
        Err(_) => {
            // `rig/name` shorthand for a known rig
            if segs.len() == 2 && known_rigs.iter().any(|r| r == segs[0]) {
                return Ok(SlingTarget::Shorthand {
                    rig: segs[0].to_string(),
                    name: segs[1].to_string(),
                });
            }
            Err(invalid("unknown role"))
        }
    }
}

/// The dispatcher.
#[derive(Clone)]
pub struct Sling<B, S> {
    registry: Registry<B>,
    supervisor: Supervisor<S>,
    town: Town,
    events: EventsLog,
    actor: AgentId,
    runtime: RuntimeConfig,
    /// Where `bd formula show` runs: the invoking process's directory.
    cwd: PathBuf,
}

impl<B: BeadsAdapter, S: SessionAdapter> Sling<B, S> {
    pub fn new(
        registry: Registry<B>,
        supervisor: Supervisor<S>,
        town: Town,
        actor: AgentId,
        runtime: RuntimeConfig,
        cwd: PathBuf,
    ) -> Self {
        let events = EventsLog::at(town.events_path());
        Self {
            registry,
            supervisor,
            town,
            events,
            actor,
            runtime,
            cwd,
        }
    }

    fn known_rigs(&self) -> Vec<String> {
        self.registry
            .routes()
            .routes()
            .iter()
            .filter_map(|r| {
                let rig = self.registry.routes().rig_of(&r.prefix)?;
                Some(rig)
            })
            .collect()
    }

    /// Dispatch `what` (a bead ID, or a formula name with `--on`).
    pub async fn sling(&self, what: &str, opts: &SlingOptions) -> Result<SlingOutcome, GtError> {
        // 1. Validate the target before touching anything.
        let known_rigs = self.known_rigs();
        let target = match &opts.target {
            Some(t) => parse_target(t, &known_rigs)?,
            None => SlingTarget::Agent(self.actor.clone()),
        };

        // 2. Verify the bead (or the formula + its --on bead).
        let (bead, formula) = self.verify_subject(what, opts).await?;

        // 3. Cross-rig guard.
        let bead_prefix = bead
            .id
            .route_prefix()
            .ok_or_else(|| GtError::not_found("bead", bead.id.as_str()))?;
        let bead_rig = self.registry.routes().rig_of(&bead_prefix);
        let target_rig = match &target {
            SlingTarget::Agent(a) if !a.rig.is_empty() => Some(a.rig.clone()),
            SlingTarget::Shorthand { rig, .. } | SlingTarget::BareRig(rig) => Some(rig.clone()),
            _ => None,
        };
        if let (Some(b), Some(t)) = (&bead_rig, &target_rig) {
            if b != t && !opts.force {
                return Err(GtError::CrossRig {
                    bead_rig: b.clone(),
                    target_rig: t.clone(),
                });
            }
        }

        // 4. Resolve to a concrete agent.
        let agent = self.resolve_target(target).await?;
        let prefix = if agent.rig.is_empty() {
            String::new()
        } else {
            self.registry
                .routes()
                .short_prefix_for_rig(&agent.rig)
                .ok_or_else(|| GtError::not_found("rig route", &agent.rig))?
        };
        let agent_bead_id = agent.bead_id(&prefix);
        let session = agent.session_name(&prefix);

        // 5. Idempotency: re-slinging the same bead is a no-op.
        if self.registry.hook_of(&agent_bead_id).await? == Some(bead.id.as_str().to_string()) {
            return Ok(SlingOutcome::AlreadyHooked);
        }

        // 6. Formula flow.
        if let Some(ref formula) = formula {
            self.materialize_formula(formula, &bead, opts).await?;
        }

        // 7. Apply the hook (atomic with rollback).
        self.registry
            .update(
                bead.id.as_str(),
                &UpdatePatch {
                    status: Some(BeadStatus::Hooked),
                    assignee: Some(agent.to_string()),
                    description: None,
                },
            )
            .await?;
        if let Err(e) = self
            .registry
            .set_hook(&agent_bead_id, Some(bead.id.as_str()))
            .await
        {
            // Roll the bead back so steps 1-7 stay atomic
            let rollback = UpdatePatch {
                status: Some(BeadStatus::Open),
                assignee: Some(String::new()),
                description: None,
            };
            if let Err(rb) = self.registry.update(bead.id.as_str(), &rollback).await {
                tracing::warn!(bead = %bead.id, error = %rb, "rollback after failed slot write also failed");
            }
            return Err(e);
        }

        let _ = self.events.append(
            "sling",
            &self.actor.to_string(),
            serde_json::json!({"bead": bead.id.as_str(), "agent": agent.to_string()}),
            chrono::Utc::now(),
        );

        // 8. Start, respawn, or nudge the session. Failures past the
        // hook are non-fatal by design.
        let home = self.town.existing_home(&agent);
        let session_id = gt_core::id::thread_id();
        let nudge = format!("[gt] hook updated: {}; re-read your hook", bead.id);
        let (session_error, spawned) = match self
            .supervisor
            .ensure_session(&session, &home, &agent, &session_id, &self.runtime, &nudge)
            .await
        {
            Ok(EnsureOutcome::Spawned) => (None, true),
            Ok(EnsureOutcome::Nudged) => (None, false),
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "session not started; next prime will recover");
                (Some(e.to_string()), false)
            }
        };

        // 9. Repair drift: stale hooked beads assigned to this agent.
        self.cleanup_stale_hooked(&agent, &bead_prefix, bead.id.as_str())
            .await;

        Ok(SlingOutcome::Hooked {
            bead: bead.id.as_str().to_string(),
            agent: agent.to_string(),
            session,
            session_error,
            spawned,
        })
    }

    async fn verify_subject(
        &self,
        what: &str,
        opts: &SlingOptions,
    ) -> Result<(Bead, Option<String>), GtError> {
        if let Some(ref on) = opts.on {
            // Formula mode: `what` names a formula, `on` names the bead.
            let exists = self
                .registry
                .adapter()
                .formula_exists(&self.cwd, what)
                .await?;
            if !exists {
                return Err(GtError::not_found("formula", what));
            }
            let bead = self.registry.show_stale(on).await?;
            return Ok((bead, Some(what.to_string())));
        }

        match self.registry.show_stale(what).await {
            Ok(bead) => Ok((bead, None)),
            Err(
                GtError::Beads(gt_adapters::BeadsError::NotFound(_))
                | GtError::Storage(StorageError::UnknownPrefix(_)),
            ) => {
                let is_formula = self
                    .registry
                    .adapter()
                    .formula_exists(&self.cwd, what)
                    .await
                    .unwrap_or(false);
                if is_formula {
                    Err(GtError::Fatal(format!(
                        "{} is a formula; attach it with --on <bead>",
                        what
                    )))
                } else if is_bead_id(what) {
                    Err(GtError::not_found("bead", what))
                } else {
                    Err(GtError::not_found("bead or formula", what))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_target(&self, target: SlingTarget) -> Result<AgentId, GtError> {
        match target {
            SlingTarget::Agent(agent) => Ok(agent),
            SlingTarget::Shorthand { rig, name } => {
                let crew_dir = self.town.rig_dir(&rig).join("crew").join(&name);
                if crew_dir.is_dir() {
                    Ok(AgentId::crew(rig, name))
                } else {
                    Ok(AgentId::polecat(rig, name))
                }
            }
            SlingTarget::BareRig(rig) => {
                let prefix = self
                    .registry
                    .routes()
                    .short_prefix_for_rig(&rig)
                    .ok_or_else(|| GtError::not_found("rig route", &rig))?;
                let marker = format!("{}-{}-polecat-", prefix, rig);
                let idle = self
                    .find_idle_agent(&format!("{}-", prefix), &marker)
                    .await?
                    .ok_or(GtError::NoIdleWorker {
                        role: "polecat",
                        scope: rig.clone(),
                    })?;
                let name = idle.trim_start_matches(&marker).to_string();
                Ok(AgentId::polecat(rig, name))
            }
            SlingTarget::DogsPool => {
                let idle = self
                    .find_idle_agent("hq-", "hq-dog-")
                    .await?
                    .ok_or(GtError::NoIdleWorker {
                        role: "dog",
                        scope: "town".to_string(),
                    })?;
                let name = idle.trim_start_matches("hq-dog-").to_string();
                Ok(AgentId::dog(name))
            }
        }
    }

    /// First agent bead under `marker` with an empty hook.
    async fn find_idle_agent(
        &self,
        prefix: &str,
        marker: &str,
    ) -> Result<Option<String>, GtError> {
        let agents = self.registry.list_by_label(prefix, LABEL_AGENT).await?;
        Ok(agents
            .into_iter()
            .filter(|b| b.id.as_str().starts_with(marker))
            .find(|b| b.hook_bead.is_empty())
            .map(|b| b.id.as_str().to_string()))
    }

    /// `bd formula` → `bd cook` → `bd mol wisp` → `bd mol bond`, all in
    /// the bead's owning database, then record the attachment on the
    /// target bead.
    async fn materialize_formula(
        &self,
        formula: &str,
        bead: &Bead,
        opts: &SlingOptions,
    ) -> Result<(), GtError> {
        let rig_db = self.registry.routes().resolve_bead(bead.id.as_str())?;
        let beads = self.registry.adapter();
        beads.cook(&rig_db, formula).await?;
        let vars = vec![
            ("feature".to_string(), bead.title.clone()),
            ("issue".to_string(), bead.id.as_str().to_string()),
        ];
        let wisp = beads.mol_wisp(&rig_db, formula, &vars).await?;
        beads.mol_bond(&rig_db, wisp.as_str(), bead.id.as_str()).await?;
        self.registry
            .set_field(bead.id.as_str(), FIELD_ATTACHED_MOLECULE, wisp.as_str())
            .await?;

        if !opts.no_convoy {
            let convoy = self
                .registry
                .create(
                    "hq",
                    &gt_adapters::CreateOpts {
                        bead_type: BeadType::Task,
                        title: format!("convoy for {}", bead.id),
                        description: format!("issue: {}", bead.id),
                        priority: Some(2),
                        assignee: None,
                        labels: vec!["gt:convoy".to_string()],
                        ephemeral: true,
                    },
                )
                .await?;
            self.registry
                .set_field(bead.id.as_str(), FIELD_CONVOY_ID, convoy.as_str())
                .await?;
        }
        Ok(())
    }

    /// Flip stale `hooked` beads for this agent back to open. Repairs
    /// the drift the single-hook invariant permits.
    async fn cleanup_stale_hooked(&self, agent: &AgentId, prefix: &str, keep: &str) {
        let filter = gt_adapters::ListFilter {
            status: Some(BeadStatus::Hooked),
            assignee: Some(agent.to_string()),
            ..Default::default()
        };
        let stale = match self.registry.list(prefix, &filter).await {
            Ok(beads) => beads,
            Err(e) => {
                tracing::warn!(error = %e, "stale hook scan failed");
                return;
            }
        };
        for bead in stale.into_iter().filter(|b| b.id != *keep) {
            let patch = UpdatePatch {
                status: Some(BeadStatus::Open),
                assignee: Some(String::new()),
                description: None,
            };
            if let Err(e) = self.registry.update(bead.id.as_str(), &patch).await {
                tracing::warn!(bead = %bead.id, error = %e, "stale hooked bead not repaired");
            } else {
                tracing::info!(bead = %bead.id, "repaired stale hooked bead");
            }
        }
    }

    /// Inverse of sling: clear the hook, reopen the bead.
    ///
    /// A missing bead is tolerated with `force` (the slot still gets
    /// cleared); failing to clear the agent slot is always fatal.
    pub async fn unsling(
        &self,
        bead_id: &str,
        agent: Option<&str>,
        force: bool,
    ) -> Result<(), GtError> {
        let assignee = match self.registry.show_stale(bead_id).await {
            Ok(bead) => Some(bead.assignee),
            Err(GtError::Beads(gt_adapters::BeadsError::NotFound(_))) if force => None,
            Err(e) => return Err(e),
        };
        let agent_str = match agent {
            Some(a) => a.to_string(),
            None => assignee
                .clone()
                .filter(|a| !a.is_empty())
                .ok_or_else(|| GtError::Fatal(format!(
                    "{} has no assignee; pass the agent explicitly",
                    bead_id
                )))?,
        };
        let agent_id = AgentId::parse(&agent_str)
            .map_err(|e| GtError::Fatal(format!("bad agent {}: {}", agent_str, e)))?;
        let prefix = if agent_id.rig.is_empty() {
            String::new()
        } else {
            self.registry
                .routes()
                .short_prefix_for_rig(&agent_id.rig)
                .ok_or_else(|| GtError::not_found("rig route", &agent_id.rig))?
        };
        let agent_bead_id = agent_id.bead_id(&prefix);

        // Fatal when this fails; the slot is the source of truth.
        self.registry.set_hook(&agent_bead_id, None).await?;

        if assignee.is_some() {
            let patch = UpdatePatch {
                status: Some(BeadStatus::Open),
                assignee: Some(String::new()),
                description: None,
            };
            if let Err(e) = self.registry.update(bead_id, &patch).await {
                tracing::warn!(bead = bead_id, error = %e, "bead status not reopened");
            }
        }

        let _ = self.events.append(
            "unsling",
            &self.actor.to_string(),
            serde_json::json!({"bead": bead_id, "agent": agent_str}),
            chrono::Utc::now(),
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "sling_tests.rs"]
mod tests;
