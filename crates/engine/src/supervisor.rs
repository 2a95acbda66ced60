// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session supervision: naming, spawning, liveness, attach.
//!
//! A session is **alive** when the multiplexer lists it and one of the
//! processes named by its `GT_PROCESS_NAMES` runs in its pane; **zombie**
//! when listed with no such process; **absent** otherwise.

use crate::GtError;
use gt_adapters::env;
use gt_adapters::SessionAdapter;
use gt_core::{AgentId, Role};
use std::collections::HashMap;
use std::path::Path;

/// Per-role agent runtime configuration: which CLI hosts the agent and
/// which process basenames prove it is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub command: String,
    pub args: Vec<String>,
    pub process_names: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["--dangerously-skip-permissions".to_string()],
            process_names: vec!["claude".to_string(), "node".to_string()],
        }
    }
}

impl RuntimeConfig {
    pub fn process_names_value(&self) -> String {
        self.process_names.join(",")
    }
}

/// Liveness of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Alive,
    /// Listed by the multiplexer but running no known agent process.
    Zombie,
    Absent,
}

/// What `ensure_session` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    Spawned,
    /// An alive session was left running and nudged instead.
    Nudged,
}

/// Build the command a fresh or respawned agent session runs.
///
/// `gt prime` is the initial user prompt, so the agent restores its
/// context before touching anything else.
pub fn build_restart_command(home: &Path, runtime: &RuntimeConfig) -> String {
    let args = if runtime.args.is_empty() {
        String::new()
    } else {
        format!(" {}", runtime.args.join(" "))
    };
    format!(
        "cd {} && exec {}{} \"gt prime\"",
        shell_quote(&home.display().to_string()),
        runtime.command,
        args
    )
}

fn shell_quote(s: &str) -> String {
    if s.bytes().all(|b| b.is_ascii_alphanumeric() || b"/._-".contains(&b)) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Environment for a fresh agent session.
pub fn session_env(agent: &AgentId, session_id: &str, runtime: &RuntimeConfig) -> Vec<(String, String)> {
    let mut vars = vec![
        (env::GT_ROLE.to_string(), agent.role.as_str().to_string()),
        (env::BD_ACTOR.to_string(), agent.to_string()),
        (
            env::GT_PROCESS_NAMES.to_string(),
            runtime.process_names_value(),
        ),
        (env::GT_SESSION_ID.to_string(), session_id.to_string()),
    ];
    if !agent.rig.is_empty() {
        vars.push((env::GT_RIG.to_string(), agent.rig.clone()));
    }
    match agent.role {
        Role::Polecat => vars.push((env::GT_POLECAT.to_string(), agent.name.clone())),
        Role::Crew => vars.push((env::GT_CREW.to_string(), agent.name.clone())),
        _ => {}
    }
    vars
}

/// Session supervisor over a multiplexer adapter.
#[derive(Clone)]
pub struct Supervisor<S> {
    sessions: S,
}

impl<S: SessionAdapter> Supervisor<S> {
    pub fn new(sessions: S) -> Self {
        Self { sessions }
    }

    pub fn adapter(&self) -> &S {
        &self.sessions
    }

    /// Classify one session by the alive/zombie/absent ladder.
    pub async fn session_state(&self, name: &str) -> Result<SessionState, GtError> {
        if !self.sessions.has_session(name).await? {
            return Ok(SessionState::Absent);
        }
        let names = match self.sessions.get_env(name, env::GT_PROCESS_NAMES).await? {
            Some(value) if !value.is_empty() => {
                value.split(',').map(str::to_string).collect::<Vec<_>>()
            }
            _ => RuntimeConfig::default().process_names,
        };
        for process in &names {
            if self.sessions.is_process_running(name, process).await? {
                return Ok(SessionState::Alive);
            }
        }
        Ok(SessionState::Zombie)
    }

    /// Classify every listed session.
    pub async fn scan(&self) -> Result<HashMap<String, SessionState>, GtError> {
        let mut map = HashMap::new();
        for name in self.sessions.list_sessions().await? {
            let state = self.session_state(&name).await?;
            map.insert(name, state);
        }
        Ok(map)
    }

    /// Make sure the agent's session is running, spawning or respawning
    /// when it is absent or a zombie, nudging when it is alive.
    ///
    /// For a same-agent restart the session keeps its environment (the
    /// multiplexer preserves it across respawn), so `GT_PROCESS_NAMES`
    /// carries over; fresh spawns get it from `runtime`.
    pub async fn ensure_session(
        &self,
        name: &str,
        home: &Path,
        agent: &AgentId,
        session_id: &str,
        runtime: &RuntimeConfig,
        nudge_message: &str,
    ) -> Result<EnsureOutcome, GtError> {
        match self.session_state(name).await? {
            SessionState::Absent => {
                let cmd = build_restart_command(home, runtime);
                let vars = session_env(agent, session_id, runtime);
                self.sessions.spawn(name, home, &cmd, &vars).await?;
                Ok(EnsureOutcome::Spawned)
            }
            SessionState::Zombie => {
                // Drop the dead pane's scrollback so the fresh agent
                // doesn't read its predecessor's last words
                if let Err(e) = self.sessions.clear_history(name).await {
                    tracing::debug!(session = name, error = %e, "history not cleared");
                }
                let cmd = build_restart_command(home, runtime);
                self.sessions.respawn(name, &cmd).await?;
                Ok(EnsureOutcome::Spawned)
            }
            SessionState::Alive => {
                self.nudge(name, nudge_message).await?;
                Ok(EnsureOutcome::Nudged)
            }
        }
    }

    /// Cooperative interruption: literal text, then Enter.
    pub async fn nudge(&self, name: &str, message: &str) -> Result<(), GtError> {
        self.sessions.send_literal(name, message).await?;
        self.sessions.send_enter(name).await?;
        Ok(())
    }

    pub async fn kill(&self, name: &str) -> Result<(), GtError> {
        Ok(self.sessions.kill(name).await?)
    }

    /// Respawn a pane for a cross-agent switch: recompute process names
    /// from the new runtime before replacing the command.
    pub async fn respawn_as(
        &self,
        name: &str,
        home: &Path,
        runtime: &RuntimeConfig,
    ) -> Result<(), GtError> {
        self.sessions
            .set_env(name, env::GT_PROCESS_NAMES, &runtime.process_names_value())
            .await?;
        let cmd = build_restart_command(home, runtime);
        Ok(self.sessions.respawn(name, &cmd).await?)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
