// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context priming: everything an agent needs injected at session start.
//!
//! Runs as the agent's first prompt. Detects the role, claims the
//! identity, announces itself for seance discovery, restores hook state,
//! and folds in `bd prime` plus pending mail.

use crate::identity::{resolve_identity, EnvIdentity, Identity};
use crate::mail::MailRouter;
use crate::registry::Registry;
use crate::GtError;
use gt_adapters::{BeadsAdapter, NotifyAdapter};
use gt_core::fields::FIELD_ATTACHED_MOLECULE;
use gt_core::{AgentId, Clock, DescFields, Role};
use gt_storage::{IdentityLock, StorageError, Town};
use std::path::Path;

/// How much context a prime emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimeMode {
    /// Fresh session: full role docs plus state restoration.
    #[default]
    Full,
    /// Post-compaction: skip role docs, restore hook and mail.
    Compact,
    /// Resume of an existing conversation, same shape as compact.
    Resume,
}

impl PrimeMode {
    /// Parse the hook-source field from stdin (`compact` / `resume`).
    pub fn from_hook_source(source: Option<&str>) -> Self {
        match source {
            Some("compact") => PrimeMode::Compact,
            Some("resume") => PrimeMode::Resume,
            _ => PrimeMode::Full,
        }
    }

    fn is_short(self) -> bool {
        !matches!(self, PrimeMode::Full)
    }
}

/// Assembled prime output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeOutput {
    pub text: String,
    pub warnings: Vec<String>,
    pub identity: Identity,
}

/// The prime driver.
pub struct ContextPrime<B, N, C> {
    registry: Registry<B>,
    router: MailRouter<B, N>,
    town: Town,
    clock: C,
}

impl<B: BeadsAdapter, N: NotifyAdapter, C: Clock> ContextPrime<B, N, C> {
    pub fn new(
        registry: Registry<B>,
        router: MailRouter<B, N>,
        town: Town,
        clock: C,
    ) -> Self {
        Self {
            registry,
            router,
            town,
            clock,
        }
    }

    /// Run a prime for the current process.
    ///
    /// `agent_pid` is the process holding the identity (the agent CLI,
    /// i.e. this process's parent when run as a prompt command).
    pub async fn run(
        &self,
        mode: PrimeMode,
        env: &EnvIdentity,
        cwd: &Path,
        session_id: &str,
        agent_pid: u32,
    ) -> Result<PrimeOutput, GtError> {
        let identity = resolve_identity(env, &self.town, cwd).ok_or_else(|| {
            GtError::Fatal(
                "cannot determine role: set GT_ROLE or run from an agent home directory"
                    .to_string(),
            )
        })?;
        let agent = identity.agent.clone();
        let mut warnings = Vec::new();
        if identity.mismatch {
            warnings.push(
                "environment and working directory disagree on the role; trusting GT_ROLE"
                    .to_string(),
            );
        }

        // Worker roles claim their identity before doing anything else
        let home = self.town.existing_home(&agent);
        if agent.role.needs_identity_lock() {
            match IdentityLock::acquire_as(&home, agent_pid, session_id, self.clock.now()) {
                Ok(lock) => {
                    // The lock file stays; successors replace it when stale
                    let _ = lock;
                }
                Err(StorageError::LockHeld {
                    pid,
                    session_id: holder_session,
                    acquired_at,
                }) => {
                    return Err(GtError::Locked {
                        holder: format!(
                            "pid {} session {} since {}",
                            pid, holder_session, acquired_at
                        ),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut text = String::new();
        // Discovery line seance greps for
        text.push_str(&format!(
            "[GAS TOWN] role:{} pid:{} session:{}\n",
            agent, agent_pid, session_id
        ));

        // A handoff marker means this context contains a historical
        // /handoff; clear it and say so.
        let marker = Town::handoff_marker_path(&home);
        if marker.is_file() {
            if let Err(e) = std::fs::remove_file(&marker) {
                tracing::warn!(path = %marker.display(), error = %e, "handoff marker not cleared");
            }
            warnings.push(
                "handoff completed: any /handoff visible in context is historical, ignore it"
                    .to_string(),
            );
        }

        if !mode.is_short() {
            text.push_str(&role_docs(&agent));
            text.push('\n');
        }

        // Hook state drives the directive
        match self.hooked_work(&agent).await? {
            Some((bead_id, molecule)) => {
                text.push_str("## Autonomous work mode\n");
                text.push_str(&format!(
                    "You have hooked work: {}. Work it to completion without waiting for input.\n",
                    bead_id
                ));
                if let Some(molecule) = molecule {
                    text.push_str(&format!(
                        "Attached molecule {} defines your step sequence; run `bd mol current {}` to see the next step.\n",
                        molecule, bead_id
                    ));
                }
            }
            None => {
                text.push_str(
                    "No work is hooked. Check `bd ready` for available work or wait for dispatch.\n",
                );
            }
        }

        // Fold in the issue store's own prime
        let db = self.db_for_agent(&agent)?;
        match self.registry.adapter().prime_output(&db).await {
            Ok(bd_prime) if !bd_prime.trim().is_empty() => {
                text.push('\n');
                text.push_str(bd_prime.trim_end());
                text.push('\n');
            }
            Ok(_) => {}
            Err(e) => warnings.push(format!("bd prime unavailable: {}", e)),
        }

        // And pending mail
        match self.router.check_inject(&agent).await {
            Ok(Some(report)) => {
                text.push('\n');
                text.push_str(&report.text);
                text.push('\n');
            }
            Ok(None) => {}
            Err(e) => warnings.push(format!("mail check failed: {}", e)),
        }

        Ok(PrimeOutput {
            text,
            warnings,
            identity,
        })
    }

    async fn hooked_work(
        &self,
        agent: &AgentId,
    ) -> Result<Option<(String, Option<String>)>, GtError> {
        let prefix = if agent.rig.is_empty() {
            String::new()
        } else {
            self.registry
                .routes()
                .short_prefix_for_rig(&agent.rig)
                .unwrap_or_default()
        };
        let agent_bead = agent.bead_id(&prefix);
        let hook = match self.registry.hook_of(&agent_bead).await {
            Ok(hook) => hook,
            Err(e) => {
                tracing::debug!(agent = %agent_bead, error = %e, "no agent bead readable");
                return Ok(None);
            }
        };
        let Some(bead_id) = hook else {
            return Ok(None);
        };
        let molecule = match self.registry.show(&bead_id).await {
            Ok(bead) => DescFields::parse(&bead.description)
                .get(FIELD_ATTACHED_MOLECULE)
                .map(str::to_string),
            Err(_) => None,
        };
        Ok(Some((bead_id, molecule)))
    }

    fn db_for_agent(&self, agent: &AgentId) -> Result<std::path::PathBuf, GtError> {
        if agent.rig.is_empty() {
            return self.registry.db_for_prefix("hq");
        }
        match self.registry.routes().prefix_for_rig(&agent.rig) {
            Some(prefix) => self.registry.db_for_prefix(&prefix),
            None => self.registry.db_for_prefix("hq"),
        }
    }
}

fn role_docs(agent: &AgentId) -> String {
    let docs = match agent.role {
        Role::Mayor => "You are the mayor: the operator's seat. You dispatch work, read escalations, and keep the town healthy.",
        Role::Deacon => "You are the deacon: the town daemon's seat. Watch agent health, execute warrants, keep boot alive.",
        Role::Boot => "You are boot, the deacon's child process. Emit heartbeats and run background chores.",
        Role::Dog => "You are a dog: a town-level pool worker. Take dispatched chores and report back.",
        Role::Witness => "You are this rig's witness. Oversee polecats, nudge the stalled, terminate the dead.",
        Role::Refinery => "You are this rig's refinery. Drain the merge queue: verify, merge, requeue on conflict.",
        Role::Crew => "You are a crew member: a persistent worker with a personal worktree.",
        Role::Polecat => "You are a polecat: an ephemeral worker. Finish the hooked work, request merge, hand off. The witness ends your session, never you.",
    };
    format!("## Role\n{}\n", docs)
}

#[cfg(test)]
#[path = "prime_tests.rs"]
mod tests;
