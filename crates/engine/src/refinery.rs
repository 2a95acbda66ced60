// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The merge queue: serialize feature branches back to each rig's trunk.
//!
//! MRs are beads with the `gt:merge-request` label. The refinery scores
//! them, verifies their branches, resolves each integration target, and
//! merges one at a time.

use crate::registry::Registry;
use crate::GtError;
use gt_adapters::git::{GitAdapter, GitError};
use gt_adapters::{BeadsAdapter, ListFilter, MergeOutcome, UpdatePatch};
use gt_core::bead::LABEL_MERGE_REQUEST;
use gt_core::fields::{FIELD_INTEGRATION_BRANCH, FIELD_RETRY_COUNT};
use gt_core::merge::{default_integration_branch, render_branch_template};
use gt_core::{Bead, BeadStatus, Clock, DescFields, MergeRequest};
use gt_storage::Town;
use serde::Deserialize;

/// Rig settings relevant to the merge queue
/// (`<rig>/settings/config.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RigSettings {
    #[serde(default)]
    pub merge_queue: MergeQueueSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeQueueSettings {
    /// Template with `{prefix}`, `{epic}`, `{title}` placeholders.
    #[serde(default)]
    pub integration_branch_template: Option<String>,
}

impl RigSettings {
    /// Load settings for a rig; a missing or malformed file is defaults.
    pub fn load(town: &Town, rig: &str) -> Self {
        let path = town.rig_settings_path(rig);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }
}

/// Integration branch resolution precedence: the epic's explicit
/// `integration_branch` field, then the configured template, then
/// `integration/<slug-of-title>`. Never ends in `/`.
pub fn resolve_epic_branch(epic: &Bead, settings: &RigSettings, prefix: &str) -> String {
    let fields = DescFields::parse(&epic.description);
    if let Some(branch) = fields.get(FIELD_INTEGRATION_BRANCH) {
        if !branch.is_empty() {
            return branch.to_string();
        }
    }
    if let Some(ref template) = settings.merge_queue.integration_branch_template {
        return render_branch_template(template, prefix, epic.id.as_str(), &epic.title);
    }
    default_integration_branch(&epic.title)
}

/// An MR with its computed queue score.
#[derive(Debug, Clone)]
pub struct ScoredMr {
    pub mr: MergeRequest,
    pub score: i64,
}

/// Outcome of processing one MR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MrOutcome {
    Merged { target: String },
    /// Conflict: retry count bumped, MR requeued.
    Requeued { retries: u32 },
    Blocked { reason: String },
}

/// Per-MR report row from a processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrReport {
    pub id: String,
    pub outcome: MrOutcome,
}

/// The refinery for one rig.
pub struct Refinery<B, C> {
    registry: Registry<B>,
    town: Town,
    clock: C,
    rig: String,
    prefix: String,
}

impl<B: BeadsAdapter, C: Clock> Refinery<B, C> {
    pub fn new(
        registry: Registry<B>,
        town: Town,
        clock: C,
        rig: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            town,
            clock,
            rig: rig.into(),
            prefix: prefix.into(),
        }
    }

    /// Open MRs scored and sorted, best first.
    pub async fn queue(&self) -> Result<Vec<ScoredMr>, GtError> {
        let filter = ListFilter {
            label: Some(LABEL_MERGE_REQUEST.to_string()),
            status: Some(BeadStatus::Open),
            ..Default::default()
        };
        let beads = self.registry.list(&self.prefix, &filter).await?;
        let now = self.clock.now();
        let mut scored = Vec::new();
        for bead in &beads {
            let mr = MergeRequest::from_bead(bead);
            let convoy_created = match mr.convoy_id {
                Some(ref convoy_id) => self
                    .registry
                    .show(convoy_id)
                    .await
                    .ok()
                    .and_then(|c| c.created_at),
                None => None,
            };
            let score = mr.score(now, convoy_created);
            scored.push(ScoredMr { mr, score });
        }
        scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.mr.id.cmp(&b.mr.id)));
        Ok(scored)
    }

    /// `mq list --verify`: confirm each branch still exists. Absent refs
    /// are reported, never auto-deleted.
    pub async fn verify(
        &self,
        git: &GitAdapter,
    ) -> Result<Vec<(ScoredMr, bool)>, GtError> {
        let queue = self.queue().await?;
        let mut out = Vec::new();
        for scored in queue {
            let exists = if scored.mr.branch.is_empty() {
                false
            } else {
                git.branch_exists(&scored.mr.branch)
                    .await
                    .map_err(git_err)?
            };
            out.push((scored, exists));
        }
        Ok(out)
    }

    /// Drain the queue once, best-scored first.
    pub async fn process(&self, git: &GitAdapter) -> Result<Vec<MrReport>, GtError> {
        let queue = self.queue().await?;
        let mut reports = Vec::new();
        for scored in queue {
            let report = self.process_one(git, &scored.mr).await?;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn process_one(&self, git: &GitAdapter, mr: &MergeRequest) -> Result<MrReport, GtError> {
        if mr.branch.is_empty() {
            return self.block(mr, "merge request has no branch field").await;
        }
        if !git.branch_exists(&mr.branch).await.map_err(git_err)? {
            return self
                .block(mr, &format!("branch {} no longer exists", mr.branch))
                .await;
        }

        let target = self.resolve_target(mr).await?;
        git.checkout_or_create(&target).await.map_err(git_err)?;
        let message = format!("Merge {} ({})", mr.branch, mr.id);
        match git.merge(&mr.branch, &message).await.map_err(git_err)? {
            MergeOutcome::Merged => {
                self.registry.close(&mr.id, "merged").await?;
                Ok(MrReport {
                    id: mr.id.clone(),
                    outcome: MrOutcome::Merged { target },
                })
            }
            MergeOutcome::Conflict(_) => {
                let retries = mr.retry_count + 1;
                self.registry
                    .set_field(&mr.id, FIELD_RETRY_COUNT, &retries.to_string())
                    .await?;
                Ok(MrReport {
                    id: mr.id.clone(),
                    outcome: MrOutcome::Requeued { retries },
                })
            }
            MergeOutcome::Failed(reason) => self.block(mr, &reason).await,
        }
    }

    async fn block(&self, mr: &MergeRequest, reason: &str) -> Result<MrReport, GtError> {
        self.registry
            .set_field(&mr.id, "blocked_reason", reason)
            .await?;
        self.registry
            .update(&mr.id, &UpdatePatch::status(BeadStatus::Blocked))
            .await?;
        Ok(MrReport {
            id: mr.id.clone(),
            outcome: MrOutcome::Blocked {
                reason: reason.to_string(),
            },
        })
    }

    /// Target branch: explicit MR field, else the epic's declaration,
    /// else the default slug branch.
    async fn resolve_target(&self, mr: &MergeRequest) -> Result<String, GtError> {
        if let Some(ref target) = mr.target {
            if !target.is_empty() {
                return Ok(target.clone());
            }
        }
        let settings = RigSettings::load(&self.town, &self.rig);
        if let Some(ref source_issue) = mr.source_issue {
            if let Ok(Some(epic_id)) = self.registry.field_of(source_issue, "epic").await {
                if let Ok(epic) = self.registry.show(&epic_id).await {
                    return Ok(resolve_epic_branch(&epic, &settings, &self.prefix));
                }
            }
        }
        Ok(default_integration_branch(
            mr.source_issue.as_deref().unwrap_or(&mr.title),
        ))
    }
}

fn git_err(e: GitError) -> GtError {
    GtError::Fatal(e.to_string())
}

#[cfg(test)]
#[path = "refinery_tests.rs"]
mod tests;
