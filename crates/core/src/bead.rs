// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bead: the common work-item type stored in the issue store.

use crate::id::ShortId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier of a bead, e.g. `gt-abc123` or `hq-deacon`.
    ///
    /// The prefix before the first `-` routes the bead to its database.
    pub struct BeadId;
}

impl BeadId {
    /// The routing prefix including the trailing dash (`gt-`), or `None`
    /// when the ID has no dash.
    pub fn route_prefix(&self) -> Option<String> {
        self.0.split_once('-').map(|(p, _)| format!("{}-", p))
    }
}

/// Pattern all bead IDs must match: `[a-z]{2,5}-[A-Za-z0-9.]+`.
pub fn is_bead_id(s: &str) -> bool {
    let Some((prefix, rest)) = s.split_once('-') else {
        return false;
    };
    (2..=5).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_lowercase())
        && !rest.is_empty()
        && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.')
}

/// Bead lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadStatus {
    #[default]
    Open,
    InProgress,
    /// Attached to an agent's hook.
    Hooked,
    Closed,
    Blocked,
}

impl BeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeadStatus::Open => "open",
            BeadStatus::InProgress => "in_progress",
            BeadStatus::Hooked => "hooked",
            BeadStatus::Closed => "closed",
            BeadStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for BeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bead type. Unknown types decode to `Other` so foreign beads stay
/// readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeadType {
    #[default]
    Task,
    Epic,
    MergeRequest,
    Wisp,
    Message,
    Dog,
    Other,
}

impl BeadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeadType::Task => "task",
            BeadType::Epic => "epic",
            BeadType::MergeRequest => "merge-request",
            BeadType::Wisp => "wisp",
            BeadType::Message => "message",
            BeadType::Dog => "dog",
            BeadType::Other => "other",
        }
    }
}

impl Serialize for BeadType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BeadType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "task" => BeadType::Task,
            "epic" => BeadType::Epic,
            "merge-request" => BeadType::MergeRequest,
            "wisp" => BeadType::Wisp,
            "message" => BeadType::Message,
            "dog" => BeadType::Dog,
            _ => BeadType::Other,
        })
    }
}

/// Label marking a bead as a merge request.
pub const LABEL_MERGE_REQUEST: &str = "gt:merge-request";
/// Label marking a bead as an agent bead.
pub const LABEL_AGENT: &str = "gt:agent";
/// Label exempting a bead from ephemeral purge.
pub const LABEL_KEEP: &str = "gt:keep";
/// Label marking an escalated bead.
pub const LABEL_ESCALATION: &str = "escalation";

/// A record in the issue store, as decoded from `bd show --json`.
///
/// Structured description fields (`key: value` lines) are a secondary key
/// space parsed via [`crate::fields::DescFields`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bead {
    pub id: BeadId,
    #[serde(rename = "type", default)]
    pub bead_type: BeadType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: BeadStatus,
    #[serde(default)]
    pub assignee: String,
    /// 0 is the highest priority.
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub ephemeral: bool,
    /// Only meaningful on agent beads: the one piece of hooked work.
    #[serde(default)]
    pub hook_bead: String,
}

impl Bead {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_merge_request(&self) -> bool {
        self.bead_type == BeadType::MergeRequest || self.has_label(LABEL_MERGE_REQUEST)
    }

    pub fn is_agent_bead(&self) -> bool {
        self.has_label(LABEL_AGENT)
    }

    /// Minutes from an `idle:N` label, when present. The label is
    /// authoritative over any derived idle time.
    pub fn idle_label_minutes(&self) -> Option<u64> {
        self.labels
            .iter()
            .find_map(|l| l.strip_prefix("idle:"))
            .and_then(|n| n.parse().ok())
    }

    /// Short display ID for log lines and tables.
    pub fn short_id(&self) -> &str {
        self.id.as_str().short(16)
    }
}

#[cfg(test)]
#[path = "bead_tests.rs"]
mod tests;
