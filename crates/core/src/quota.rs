// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential accounts and quota state.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Availability of a credential account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Available,
    Limited,
    Cooldown,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Available => "available",
            AccountStatus::Limited => "limited",
            AccountStatus::Cooldown => "cooldown",
        }
    }
}

/// A configured credential handle (`mayor/accounts.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub email: String,
    /// Directory the session's `CLAUDE_CONFIG_DIR` points at.
    pub config_dir: PathBuf,
    #[serde(default)]
    pub is_default: bool,
}

/// The accounts config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub accounts: IndexMap<String, AccountInfo>,
}

impl AccountsConfig {
    /// Handle whose config dir matches, for mapping a session's env back
    /// to its account.
    pub fn handle_for_config_dir(&self, dir: &std::path::Path) -> Option<&str> {
        self.accounts
            .iter()
            .find(|(_, info)| info.config_dir == dir)
            .map(|(handle, _)| handle.as_str())
    }
}

/// Per-account quota bookkeeping (`.beads/quota-state.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountQuota {
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub limited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// The quota state file. Mutations happen under the lifecycle lock and
/// are saved exactly once per rotation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    #[serde(default)]
    pub accounts: IndexMap<String, AccountQuota>,
}

impl QuotaState {
    /// Available account handles in least-recently-used order.
    ///
    /// Accounts with no recorded use sort first (never used beats any
    /// timestamp), ties keep file order.
    pub fn available_lru(&self) -> Vec<String> {
        let mut handles: Vec<(&String, Option<DateTime<Utc>>)> = self
            .accounts
            .iter()
            .filter(|(_, q)| q.status == AccountStatus::Available)
            .map(|(h, q)| (h, q.last_used))
            .collect();
        handles.sort_by_key(|(_, last_used)| *last_used);
        handles.into_iter().map(|(h, _)| h.clone()).collect()
    }

    /// Mark an account rate-limited. Idempotent: a second mark keeps the
    /// original `limited_at`.
    pub fn mark_limited(
        &mut self,
        handle: &str,
        at: DateTime<Utc>,
        resets_at: Option<DateTime<Utc>>,
    ) {
        let q = self.accounts.entry(handle.to_string()).or_default();
        if q.status != AccountStatus::Limited {
            q.status = AccountStatus::Limited;
            q.limited_at = Some(at);
        }
        if resets_at.is_some() {
            q.resets_at = resets_at;
        }
    }

    /// Record that an account was handed to a session.
    pub fn mark_used(&mut self, handle: &str, now: DateTime<Utc>) {
        let q = self.accounts.entry(handle.to_string()).or_default();
        q.last_used = Some(now);
    }

    /// Flip `limited|cooldown` accounts back to `available`. With
    /// `handles`, only those; otherwise all.
    pub fn clear(&mut self, handles: Option<&[String]>) -> usize {
        let mut cleared = 0;
        for (handle, q) in &mut self.accounts {
            if let Some(only) = handles {
                if !only.contains(handle) {
                    continue;
                }
            }
            if matches!(q.status, AccountStatus::Limited | AccountStatus::Cooldown) {
                q.status = AccountStatus::Available;
                q.limited_at = None;
                q.resets_at = None;
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;
