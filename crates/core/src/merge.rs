// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge-request parsing and queue scoring.

use crate::bead::Bead;
use crate::fields::{self, DescFields};
use chrono::{DateTime, Utc};
use std::sync::OnceLock;

/// Base score per priority number (0 is highest priority).
const BASE_SCORES: [i64; 5] = [1000, 800, 600, 400, 200];
/// One point per minute of age, capped.
const AGE_BONUS_CAP: i64 = 300;
/// Penalty per failed merge attempt.
const RETRY_PENALTY: i64 = -50;
/// Half a point per minute the convoy has waited, capped.
const CONVOY_BONUS_CAP: i64 = 150;

/// A merge request, parsed out of a `gt:merge-request` bead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub id: String,
    pub title: String,
    pub priority: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub branch: String,
    pub target: Option<String>,
    pub source_issue: Option<String>,
    pub worker: Option<String>,
    pub rig: Option<String>,
    pub retry_count: u32,
    pub convoy_id: Option<String>,
}

impl MergeRequest {
    /// Parse the MR view of a bead. Field absence is tolerated; an MR
    /// with no `branch` field is still listed (and reported by verify).
    pub fn from_bead(bead: &Bead) -> Self {
        let f = DescFields::parse(&bead.description);
        Self {
            id: bead.id.as_str().to_string(),
            title: bead.title.clone(),
            priority: bead.priority,
            created_at: bead.created_at,
            branch: f.get(fields::FIELD_BRANCH).unwrap_or_default().to_string(),
            target: f.get(fields::FIELD_TARGET).map(str::to_string),
            source_issue: f.get(fields::FIELD_SOURCE_ISSUE).map(str::to_string),
            worker: f.get(fields::FIELD_WORKER).map(str::to_string),
            rig: f.get(fields::FIELD_RIG).map(str::to_string),
            retry_count: f
                .get(fields::FIELD_RETRY_COUNT)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            convoy_id: f.get(fields::FIELD_CONVOY_ID).map(str::to_string),
        }
    }

    /// Queue score; higher is processed first.
    ///
    /// `score = BASE[priority] + age bonus + retry penalty + convoy bonus`.
    pub fn score(&self, now: DateTime<Utc>, convoy_created_at: Option<DateTime<Utc>>) -> i64 {
        let base = BASE_SCORES
            .get(self.priority.clamp(0, i64::MAX) as usize)
            .copied()
            .unwrap_or(BASE_SCORES[BASE_SCORES.len() - 1]);
        let age_mins = self
            .created_at
            .map(|t| (now - t).num_minutes().max(0))
            .unwrap_or(0);
        let convoy_mins = convoy_created_at
            .map(|t| (now - t).num_minutes().max(0))
            .unwrap_or(0);
        base + age_mins.min(AGE_BONUS_CAP)
            + RETRY_PENALTY * i64::from(self.retry_count)
            + (convoy_mins / 2).min(CONVOY_BONUS_CAP)
    }
}

/// Worker and issue extracted from a branch name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchParts {
    pub worker: String,
    pub issue: String,
}

fn bead_id_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"[a-z]{2,5}-[A-Za-z0-9.]+").unwrap_or_else(|_| unreachable!())
    })
}

fn session_suffix_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"-mk[0-9a-f]{6,8}$").unwrap_or_else(|_| unreachable!())
    })
}

/// Parse worker and issue from a branch name.
///
/// Handles the shapes polecat branches take:
/// - `polecat/<worker>/<issue>[@<session>]` → both parts
/// - `polecat/<worker>[-<session>]` → worker only, no fake issue
/// - anything else → no worker; the first bead-ID-shaped token is the issue
pub fn parse_branch_name(branch: &str) -> BranchParts {
    let segs: Vec<&str> = branch.split('/').collect();
    if segs.len() >= 2 && segs[0] == "polecat" {
        let worker = session_suffix_re().replace(segs[1], "").to_string();
        let issue = if segs.len() >= 3 {
            // Session suffix rides after `@` on the issue segment
            segs[2].split('@').next().unwrap_or_default().to_string()
        } else {
            String::new()
        };
        return BranchParts { worker, issue };
    }
    let issue = bead_id_re()
        .find(branch)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    BranchParts {
        worker: String::new(),
        issue,
    }
}

/// Slug a title for use in a git ref: lowercase, alphanumeric runs joined
/// by single dashes, at most 40 characters, never empty-adjacent dashes.
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    let mut dash_pending = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if dash_pending && !out.is_empty() {
                out.push('-');
            }
            dash_pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            dash_pending = true;
        }
        if out.len() >= 40 {
            break;
        }
    }
    out
}

/// Default integration branch for an MR whose epic declares nothing.
///
/// Never ends in `/`: an unsluggable title falls back to `unnamed`.
pub fn default_integration_branch(title: &str) -> String {
    let s = slug(title);
    if s.is_empty() {
        "integration/unnamed".to_string()
    } else {
        format!("integration/{}", s)
    }
}

/// Render a configured integration-branch template.
///
/// Supported placeholders: `{prefix}`, `{epic}`, `{title}` (slugged).
/// Empty substitutions are trimmed so the result never ends in `/`.
pub fn render_branch_template(template: &str, prefix: &str, epic: &str, title: &str) -> String {
    let rendered = template
        .replace("{prefix}", prefix)
        .replace("{epic}", epic)
        .replace("{title}", &slug(title));
    let trimmed = rendered.trim_end_matches('/');
    if trimmed.is_empty() {
        "integration/unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
