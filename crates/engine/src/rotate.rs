// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential rotation: detect rate-limited sessions, swap accounts.
//!
//! The whole scan + plan + execute cycle runs under the quota-state
//! lifecycle lock and saves the state file exactly once at the end, so
//! concurrent cycles cannot interleave their writes.

use crate::supervisor::{build_restart_command, RuntimeConfig, Supervisor};
use crate::GtError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use gt_adapters::env::{CLAUDE_CONFIG_DIR, GT_ROLE};
use gt_adapters::SessionAdapter;
use gt_core::{AccountsConfig, AgentId, Clock, QuotaState};
use gt_storage::{QuotaFile, RouteTable, StorageError, Town};
use std::path::Path;
use std::sync::OnceLock;

/// How many pane lines the scan inspects.
const SCAN_LINES: u32 = 80;

/// One rate-limited session found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub session: String,
    /// Account handle the session currently uses, when its
    /// `CLAUDE_CONFIG_DIR` maps to a configured account.
    pub handle: Option<String>,
    pub resets_at: Option<DateTime<Utc>>,
}

/// LRU pairing of limited sessions to available accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    pub pairs: Vec<(ScanHit, String)>,
    /// Limited sessions with no account left to give them.
    pub unassigned: Vec<String>,
}

/// Per-session outcome of an executed rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationResult {
    pub session: String,
    pub rotated: bool,
    pub account: Option<String>,
    pub error: Option<String>,
}

fn rate_limit_patterns() -> &'static Vec<regex::Regex> {
    static PATTERNS: OnceLock<Vec<regex::Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)rate.?limit(ed|s)?\b",
            r"(?i)usage limit (reached|hit)",
            r"(?i)5-hour limit reached",
            r"(?i)limit will reset",
            r"(?i)out of (usage|quota)",
            r"(?i)overloaded.?error",
        ]
        .iter()
        .filter_map(|p| regex::Regex::new(p).ok())
        .collect()
    })
}

/// Whether captured pane output shows a rate limit.
pub fn matches_rate_limit(output: &str) -> bool {
    rate_limit_patterns().iter().any(|re| re.is_match(output))
}

/// Extract a "resets at 4pm" style time from pane output, projected onto
/// the next occurrence after `now`.
pub fn parse_reset_time(output: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        regex::Regex::new(r"(?i)resets? (?:at )?(\d{1,2})(?::(\d{2}))?\s*(am|pm)?")
            .unwrap_or_else(|_| unreachable!())
    });
    let caps = re.captures(output)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(ref meridiem) if meridiem == "pm" && hour < 12 => hour += 12,
        Some(ref meridiem) if meridiem == "am" && hour == 12 => hour = 0,
        _ => {}
    }
    if hour > 23 || minute > 59 {
        return None;
    }
    let candidate = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, minute, 0)
        .single()?;
    if candidate > now {
        Some(candidate)
    } else {
        Some(candidate + chrono::Duration::days(1))
    }
}

/// Build the LRU pairing. Pure, so plans are testable without sessions.
pub fn plan_rotation(hits: &[ScanHit], state: &QuotaState) -> RotationPlan {
    let available = state.available_lru();
    let mut plan = RotationPlan::default();
    for (i, hit) in hits.iter().enumerate() {
        match available.get(i) {
            Some(handle) => plan.pairs.push((hit.clone(), handle.clone())),
            None => plan.unassigned.push(hit.session.clone()),
        }
    }
    plan
}

/// The rotation driver.
pub struct QuotaRotator<S, C> {
    supervisor: Supervisor<S>,
    town: Town,
    routes: RouteTable,
    accounts: AccountsConfig,
    quota_file: QuotaFile,
    runtime: RuntimeConfig,
    clock: C,
}

impl<S: SessionAdapter, C: Clock> QuotaRotator<S, C> {
    pub fn new(
        supervisor: Supervisor<S>,
        town: Town,
        routes: RouteTable,
        accounts: AccountsConfig,
        clock: C,
    ) -> Self {
        let quota_file = QuotaFile::at(town.quota_state_path());
        Self {
            supervisor,
            town,
            routes,
            accounts,
            quota_file,
            runtime: RuntimeConfig::default(),
            clock,
        }
    }

    /// Capture recent output from every agent session and test it
    /// against the rate-limit pattern library.
    pub async fn scan(&self) -> Result<Vec<ScanHit>, GtError> {
        let sessions = self.supervisor.adapter();
        let mut hits = Vec::new();
        for name in sessions.list_sessions().await? {
            // Only sessions this town spawned carry GT_ROLE
            if sessions.get_env(&name, GT_ROLE).await?.is_none() {
                continue;
            }
            let output = sessions.capture_output(&name, SCAN_LINES).await?;
            if !matches_rate_limit(&output) {
                continue;
            }
            let handle = match sessions.get_env(&name, CLAUDE_CONFIG_DIR).await? {
                Some(dir) => self
                    .accounts
                    .handle_for_config_dir(Path::new(&dir))
                    .map(str::to_string),
                None => None,
            };
            hits.push(ScanHit {
                session: name,
                handle,
                resets_at: parse_reset_time(&output, self.clock.now()),
            });
        }
        Ok(hits)
    }

    /// Scan + plan + execute under the lifecycle lock; one state save.
    pub async fn rotate(&self) -> Result<Vec<RotationResult>, GtError> {
        let mut guard = self.quota_file.lock().map_err(|e| match e {
            StorageError::QuotaLocked => GtError::Locked {
                holder: "another rotation cycle".to_string(),
            },
            other => GtError::Storage(other),
        })?;
        let mut state = self.quota_file.load()?;
        let now = self.clock.now();

        let hits = self.scan().await?;
        let plan = plan_rotation(&hits, &state);
        let mut results = Vec::new();

        for (hit, new_handle) in &plan.pairs {
            match self.apply_pair(hit, new_handle).await {
                Ok(()) => {
                    // Old account limited (idempotent), new one used
                    if let Some(ref old) = hit.handle {
                        state.mark_limited(old, now, hit.resets_at);
                    }
                    state.mark_used(new_handle, now);
                    results.push(RotationResult {
                        session: hit.session.clone(),
                        rotated: true,
                        account: Some(new_handle.clone()),
                        error: None,
                    });
                }
                Err(e) => {
                    results.push(RotationResult {
                        session: hit.session.clone(),
                        rotated: false,
                        account: Some(new_handle.clone()),
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        for session in &plan.unassigned {
            results.push(RotationResult {
                session: session.clone(),
                rotated: false,
                account: None,
                error: Some("no available account".to_string()),
            });
        }

        // Exactly one save, covering every session rotated this cycle
        guard.save(&state)?;
        Ok(results)
    }

    async fn apply_pair(&self, hit: &ScanHit, new_handle: &str) -> Result<(), GtError> {
        let info = self
            .accounts
            .accounts
            .get(new_handle)
            .ok_or_else(|| GtError::not_found("account", new_handle))?;
        let sessions = self.supervisor.adapter();
        sessions
            .set_env(
                &hit.session,
                CLAUDE_CONFIG_DIR,
                &info.config_dir.display().to_string(),
            )
            .await?;

        // Same-agent respawn: the session keeps its environment, so
        // GT_PROCESS_NAMES carries over
        let home = self
            .agent_for_session(&hit.session)
            .map(|agent| self.town.existing_home(&agent))
            .unwrap_or_else(|| self.town.root().to_path_buf());
        let cmd = build_restart_command(&home, &self.runtime);
        sessions.respawn(&hit.session, &cmd).await?;
        Ok(())
    }

    fn agent_for_session(&self, session: &str) -> Option<AgentId> {
        if session.starts_with("hq-") {
            return AgentId::from_session_name(session, "", "");
        }
        let prefix = session.split('-').next()?;
        let rig = self.routes.rig_of(&format!("{}-", prefix))?;
        AgentId::from_session_name(session, prefix, &rig)
    }

    /// Flip limited/cooldown accounts back to available. One locked
    /// load-mutate-save.
    pub async fn clear(&self, handles: Option<&[String]>) -> Result<usize, GtError> {
        let mut guard = self.quota_file.lock().map_err(|e| match e {
            StorageError::QuotaLocked => GtError::Locked {
                holder: "another rotation cycle".to_string(),
            },
            other => GtError::Storage(other),
        })?;
        let mut state = self.quota_file.load()?;
        let cleared = state.clear(handles);
        guard.save(&state)?;
        Ok(cleared)
    }

    /// Read-only view for `gt quota status`.
    pub fn status(&self) -> Result<(AccountsConfig, QuotaState), GtError> {
        Ok((self.accounts.clone(), self.quota_file.load()?))
    }
}

#[cfg(test)]
#[path = "rotate_tests.rs"]
mod tests;
