// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitoring: stuck-agent detection, warrants, recovery.
//!
//! Runs as the single-threaded loop inside the deacon. Each cycle scans
//! sessions, classifies every agent bead, nudges or files warrants, then
//! executes the docket.

use crate::registry::Registry;
use crate::supervisor::{RuntimeConfig, SessionState, Supervisor};
use crate::GtError;
use chrono::{DateTime, Utc};
use gt_adapters::{BeadsAdapter, CreateOpts, SessionAdapter};
use gt_core::fields::FIELD_HEARTBEAT;
use gt_core::{AgentId, Bead, BeadType, Clock, DescFields, Warrant};
use gt_storage::{Town, WarrantStore};
use std::collections::HashSet;

/// Thresholds, in minutes, for the classification table.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub stall_mins: u64,
    pub gupp_mins: u64,
    pub zombie_dead_mins: u64,
    /// Boot heartbeat age past which the deacon session is respawned.
    pub boot_stale_mins: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stall_mins: 15,
            gupp_mins: 30,
            zombie_dead_mins: 10,
            boot_stale_mins: 10,
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthClass {
    Ok,
    /// Hooked and quiet for a while; nudge.
    Stalled,
    /// Hooked work with no observable progress for too long.
    GuppViolation,
    /// Session listed but running no agent process for too long.
    DeadWorker,
    /// Hooked work whose session is gone entirely.
    Crashed,
}

/// Classify one agent. `idle_mins` is `None` when no idle signal exists
/// (no label and no closed molecule step).
pub fn classify(
    has_hook: bool,
    idle_mins: Option<u64>,
    state: SessionState,
    config: &HealthConfig,
) -> HealthClass {
    if let Some(idle) = idle_mins {
        if has_hook && idle >= config.gupp_mins {
            return HealthClass::GuppViolation;
        }
        if has_hook && idle >= config.stall_mins {
            return HealthClass::Stalled;
        }
        if state == SessionState::Zombie && idle >= config.zombie_dead_mins {
            return HealthClass::DeadWorker;
        }
    }
    if state == SessionState::Absent && has_hook {
        return HealthClass::Crashed;
    }
    HealthClass::Ok
}

/// What one cycle observed and did.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    pub scanned: usize,
    pub nudged: Vec<String>,
    pub escalated: Vec<String>,
    pub warrants_filed: Vec<String>,
    pub warrants_executed: Vec<String>,
    pub redispatched: Vec<String>,
    pub boot_respawned: bool,
}

/// The health monitor driving §4.5 cycles.
pub struct HealthMonitor<B, S, C> {
    registry: Registry<B>,
    supervisor: Supervisor<S>,
    town: Town,
    warrants: WarrantStore,
    clock: C,
    config: HealthConfig,
    runtime: RuntimeConfig,
    filed_by: String,
    /// GUPP targets already nudged once; the next violation escalates.
    gupp_nudged: HashSet<String>,
}

impl<B: BeadsAdapter, S: SessionAdapter, C: Clock> HealthMonitor<B, S, C> {
    pub fn new(
        registry: Registry<B>,
        supervisor: Supervisor<S>,
        town: Town,
        clock: C,
        config: HealthConfig,
        filed_by: impl Into<String>,
    ) -> Self {
        let warrants = WarrantStore::at(town.warrants_dir());
        Self {
            registry,
            supervisor,
            town,
            warrants,
            clock,
            config,
            runtime: RuntimeConfig::default(),
            filed_by: filed_by.into(),
            gupp_nudged: HashSet::new(),
        }
    }

    /// Run one full cycle: scan, classify, act, execute warrants, check
    /// the boot heartbeat.
    pub async fn cycle(&mut self) -> Result<HealthReport, GtError> {
        let mut report = HealthReport::default();
        let sessions = self.supervisor.scan().await?;
        let agents = self.registry.list_agent_beads().await?;
        report.scanned = agents.len();
        let now = self.clock.now();
        let mut crashed: Vec<Bead> = Vec::new();

        for agent_bead in &agents {
            // Session name and agent bead ID share one shape
            let session = agent_bead.id.as_str().to_string();
            let state = sessions
                .get(&session)
                .copied()
                .unwrap_or(SessionState::Absent);
            let has_hook = !agent_bead.hook_bead.is_empty();
            let idle = self.idle_minutes(agent_bead, now).await;
            match classify(has_hook, idle, state, &self.config) {
                HealthClass::Ok => {
                    self.gupp_nudged.remove(&session);
                }
                HealthClass::Stalled => {
                    let msg = format!(
                        "[gt] you have hooked work ({}) idle {}m; please continue or hand off",
                        agent_bead.hook_bead,
                        idle.unwrap_or(0)
                    );
                    if self.supervisor.nudge(&session, &msg).await.is_ok() {
                        report.nudged.push(session.clone());
                    }
                }
                HealthClass::GuppViolation => {
                    if self.gupp_nudged.insert(session.clone()) {
                        let msg = format!(
                            "[gt] GUPP: hooked work ({}) idle {}m with no progress; act now",
                            agent_bead.hook_bead,
                            idle.unwrap_or(0)
                        );
                        if self.supervisor.nudge(&session, &msg).await.is_ok() {
                            report.nudged.push(session.clone());
                        }
                    } else {
                        self.escalate(agent_bead, idle.unwrap_or(0)).await;
                        report.escalated.push(session.clone());
                    }
                }
                HealthClass::DeadWorker => {
                    if self.file_warrant(agent_bead, "zombie session with no agent process", now).await {
                        report.warrants_filed.push(session.clone());
                    }
                }
                HealthClass::Crashed => {
                    if self
                        .file_warrant(agent_bead, "session gone while work was hooked", now)
                        .await
                    {
                        report.warrants_filed.push(session.clone());
                    }
                    crashed.push(agent_bead.clone());
                }
            }
        }

        // Execute before re-dispatching so a fresh session is never the
        // warrant's victim
        report.warrants_executed = self.execute_warrants().await?;
        for agent_bead in &crashed {
            if self.redispatch(agent_bead).await {
                report.redispatched.push(agent_bead.id.as_str().to_string());
            }
        }
        report.boot_respawned = self.boot_watchdog(now).await;
        Ok(report)
    }

    /// Idle minutes: the `idle:N` label is authoritative; otherwise the
    /// youngest closed step of the hooked bead's molecule.
    async fn idle_minutes(&self, agent_bead: &Bead, now: DateTime<Utc>) -> Option<u64> {
        if let Some(mins) = agent_bead.idle_label_minutes() {
            return Some(mins);
        }
        if agent_bead.hook_bead.is_empty() {
            return None;
        }
        let steps = self
            .registry
            .molecule_of(&agent_bead.hook_bead)
            .await
            .ok()?;
        let youngest = steps.iter().filter_map(|s| s.closed_at).max()?;
        Some((now - youngest).num_minutes().max(0) as u64)
    }

    async fn escalate(&self, agent_bead: &Bead, idle: u64) {
        let opts = CreateOpts {
            bead_type: BeadType::Task,
            title: format!("GUPP violation: {} idle {}m", agent_bead.id, idle),
            description: format!(
                "agent: {}\nhook: {}\nfiled_by: {}",
                agent_bead.id, agent_bead.hook_bead, self.filed_by
            ),
            priority: Some(0),
            assignee: Some("mayor".to_string()),
            labels: vec!["escalation".to_string()],
            ephemeral: false,
        };
        if let Err(e) = self.registry.create("hq", &opts).await {
            tracing::warn!(agent = %agent_bead.id, error = %e, "escalation not filed");
        }
    }

    /// File a warrant unless a pending one already names this target.
    async fn file_warrant(&self, agent_bead: &Bead, reason: &str, now: DateTime<Utc>) -> bool {
        let target = match self.agent_of(agent_bead) {
            Some(agent) => agent.to_string(),
            None => agent_bead.id.as_str().to_string(),
        };
        match self.warrants.get(&target) {
            Ok(Some(existing)) if !existing.executed => return false,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "warrant lookup failed");
                return false;
            }
        }
        let warrant = Warrant::file(&target, reason, &self.filed_by, now);
        match self.warrants.put(&warrant) {
            Ok(_) => {
                tracing::info!(target = %target, reason, "warrant filed");
                true
            }
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "warrant not filed");
                false
            }
        }
    }

    /// Execute every pending warrant: kill the session (absent is fine),
    /// then flip `executed`. Executed warrants are never touched again.
    pub async fn execute_warrants(&self) -> Result<Vec<String>, GtError> {
        let mut executed = Vec::new();
        for mut warrant in self.warrants.pending()? {
            if let Some(session) = self.session_for_target(&warrant.target) {
                if let Err(e) = self.supervisor.kill(&session).await {
                    tracing::warn!(session = %session, error = %e, "warrant kill failed");
                }
            }
            if warrant.mark_executed(self.clock.now()) {
                self.warrants.put(&warrant)?;
                executed.push(warrant.target.clone());
            }
        }
        Ok(executed)
    }

    /// Respawn the deacon when boot's heartbeat bead has gone very stale.
    async fn boot_watchdog(&self, now: DateTime<Utc>) -> bool {
        let boot_bead = match self.registry.show("hq-boot").await {
            Ok(bead) => bead,
            Err(_) => return false,
        };
        let heartbeat = DescFields::parse(&boot_bead.description)
            .get(FIELD_HEARTBEAT)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc));
        let Some(beat) = heartbeat else {
            return false;
        };
        let age = (now - beat).num_minutes().max(0) as u64;
        if age < self.config.boot_stale_mins {
            return false;
        }
        tracing::warn!(age_mins = age, "boot heartbeat is very stale, respawning deacon");
        let deacon = AgentId::deacon();
        let home = self.town.home(&deacon);
        let session = deacon.session_name("");
        if let Err(e) = self.supervisor.respawn_as(&session, &home, &self.runtime).await {
            tracing::warn!(error = %e, "deacon respawn failed");
            return false;
        }
        true
    }

    fn agent_of(&self, agent_bead: &Bead) -> Option<AgentId> {
        self.registry.agent_for_bead_id(agent_bead.id.as_str())
    }

    /// The session a warrant target maps to, via the target's rig prefix.
    fn session_for_target(&self, target: &str) -> Option<String> {
        let agent = AgentId::parse(target).ok()?;
        let prefix = if agent.rig.is_empty() {
            String::new()
        } else {
            self.registry.routes().short_prefix_for_rig(&agent.rig)?
        };
        Some(agent.session_name(&prefix))
    }

    /// Restart a crashed agent's session so its hooked work resumes.
    async fn redispatch(&self, agent_bead: &Bead) -> bool {
        let Some(agent) = self.agent_of(agent_bead) else {
            return false;
        };
        let prefix = if agent.rig.is_empty() {
            String::new()
        } else {
            match self.registry.routes().short_prefix_for_rig(&agent.rig) {
                Some(p) => p,
                None => return false,
            }
        };
        let session = agent.session_name(&prefix);
        let home = self.town.existing_home(&agent);
        let session_id = gt_core::id::thread_id();
        let nudge = "[gt] session restarted; run gt prime".to_string();
        match self
            .supervisor
            .ensure_session(&session, &home, &agent, &session_id, &self.runtime, &nudge)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "redispatch failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
