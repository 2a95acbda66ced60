// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt doctor`: detection-and-fix for the recurring failure modes.

use crate::ctx::Ctx;
use crate::table::{Column, Table};
use anyhow::Result;
use clap::Args;
use gt_adapters::{ListFilter, UpdatePatch};
use gt_core::{BeadStatus, Role};
use gt_engine::SessionState;
use gt_storage::{IdentityLock, QuotaFile, WarrantStore};
use std::path::PathBuf;

#[derive(Args)]
pub struct DoctorArgs {
    /// Apply the safe fixes (remove stale locks, reopen orphaned beads)
    #[arg(long)]
    pub fix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl CheckStatus {
    fn word(self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
        }
    }
}

struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
    remediation: String,
}

impl CheckResult {
    fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Ok,
            detail: detail.into(),
            remediation: String::new(),
        }
    }

    fn warn(name: &'static str, detail: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            detail: detail.into(),
            remediation: remediation.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
            remediation: remediation.into(),
        }
    }
}

pub async fn run(ctx: &Ctx, args: DoctorArgs) -> Result<()> {
    let mut results = Vec::new();

    results.push(check_routes(ctx));
    results.push(check_locks(ctx, args.fix));
    results.push(check_sessions(ctx).await);
    results.push(check_warrants(ctx));
    results.push(check_quota_lock(ctx));
    results.push(check_orphaned_hooks(ctx, args.fix).await);

    let mut table = Table::new(vec![
        Column::left("CHECK"),
        Column::status("STATUS"),
        Column::left("DETAIL").max(60),
        Column::muted("REMEDIATION"),
    ]);
    let mut failed = false;
    for result in &results {
        failed |= result.status == CheckStatus::Fail;
        table.row(vec![
            result.name.to_string(),
            result.status.word().to_string(),
            result.detail.clone(),
            result.remediation.clone(),
        ]);
    }
    print!("{}", table.render());
    if failed {
        anyhow::bail!("doctor found failures");
    }
    Ok(())
}

fn check_routes(ctx: &Ctx) -> CheckResult {
    let path = ctx.town.routes_path();
    if !path.is_file() {
        return CheckResult::fail(
            "routes",
            "no .beads/routes.jsonl at the town root",
            "create it with one {\"prefix\":…,\"path\":…} line per rig",
        );
    }
    CheckResult::ok("routes", format!("{} route(s)", ctx.routes.routes().len()))
}

/// Worker homes whose identity lock names a dead process.
fn stale_lock_paths(ctx: &Ctx) -> Vec<PathBuf> {
    let mut homes = Vec::new();
    for route in ctx.routes.routes() {
        let Some(rig) = ctx.routes.rig_of(&route.prefix) else {
            continue;
        };
        for kind in ["crew", "polecats"] {
            let dir = ctx.town.rig_dir(&rig).join(kind);
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.filter_map(|e| e.ok()) {
                homes.push(entry.path());
                // Nested polecat layout keeps the worktree one level down
                homes.push(entry.path().join(&rig));
            }
        }
        for singleton in [Role::Witness, Role::Refinery] {
            homes.push(
                ctx.town
                    .rig_dir(&rig)
                    .join(singleton.as_str())
                    .join("rig"),
            );
        }
    }
    homes
        .into_iter()
        .map(|home| gt_storage::Town::lock_path(&home))
        .filter(|path| path.is_file())
        .filter(|path| IdentityLock::is_stale(path).unwrap_or(false))
        .collect()
}

fn check_locks(ctx: &Ctx, fix: bool) -> CheckResult {
    let stale = stale_lock_paths(ctx);
    if stale.is_empty() {
        return CheckResult::ok("identity-locks", "no stale locks");
    }
    if fix {
        let mut removed = 0;
        for path in &stale {
            if std::fs::remove_file(path).is_ok() {
                removed += 1;
            }
        }
        return CheckResult::ok(
            "identity-locks",
            format!("removed {} stale lock(s)", removed),
        );
    }
    CheckResult::warn(
        "identity-locks",
        format!("{} stale lock(s) held by dead processes", stale.len()),
        "run `gt doctor --fix`",
    )
}

async fn check_sessions(ctx: &Ctx) -> CheckResult {
    match ctx.supervisor().scan().await {
        Ok(map) => {
            let zombies: Vec<&str> = map
                .iter()
                .filter(|(_, state)| **state == SessionState::Zombie)
                .map(|(name, _)| name.as_str())
                .collect();
            if zombies.is_empty() {
                CheckResult::ok("sessions", format!("{} session(s), none zombie", map.len()))
            } else {
                CheckResult::warn(
                    "sessions",
                    format!("zombie session(s): {}", zombies.join(", ")),
                    "the deacon will warrant them; or kill-session by hand",
                )
            }
        }
        Err(e) => CheckResult::warn("sessions", format!("scan failed: {}", e), "is tmux running?"),
    }
}

fn check_warrants(ctx: &Ctx) -> CheckResult {
    match WarrantStore::at(ctx.town.warrants_dir()).pending() {
        Ok(pending) if pending.is_empty() => CheckResult::ok("warrants", "no pending warrants"),
        Ok(pending) => CheckResult::warn(
            "warrants",
            format!("{} pending warrant(s)", pending.len()),
            "start gtd so the docket drains",
        ),
        Err(e) => CheckResult::fail(
            "warrants",
            format!("warrants directory unreadable: {}", e),
            "check permissions on warrants/",
        ),
    }
}

fn check_quota_lock(ctx: &Ctx) -> CheckResult {
    let quota = QuotaFile::at(ctx.town.quota_state_path());
    match quota.lock() {
        Ok(_guard) => CheckResult::ok("quota-lock", "lifecycle lock is free"),
        Err(gt_storage::StorageError::QuotaLocked) => CheckResult::warn(
            "quota-lock",
            "a rotation cycle holds the lock",
            "wait for it, or find the stuck `gt quota rotate`",
        ),
        Err(e) => CheckResult::fail(
            "quota-lock",
            format!("lock probe failed: {}", e),
            "check permissions on .beads/",
        ),
    }
}

/// Hooked beads whose assignee's agent bead no longer points back.
async fn check_orphaned_hooks(ctx: &Ctx, fix: bool) -> CheckResult {
    let registry = ctx.registry();
    let agent_hooks: std::collections::HashMap<String, String> = match registry
        .list_agent_beads()
        .await
    {
        Ok(agents) => agents
            .into_iter()
            .map(|b| (b.id.as_str().to_string(), b.hook_bead))
            .collect(),
        Err(e) => {
            return CheckResult::warn(
                "hooked-beads",
                format!("agent bead scan failed: {}", e),
                "is bd on PATH and the town DB served?",
            )
        }
    };

    let mut orphaned = Vec::new();
    let mut prefixes: Vec<String> = ctx
        .routes
        .routes()
        .iter()
        .map(|r| r.prefix.clone())
        .collect();
    if !prefixes.iter().any(|p| p == "hq-") {
        prefixes.push("hq-".into());
    }
    for prefix in prefixes {
        let hooked = match registry
            .list(&prefix, &ListFilter::status(BeadStatus::Hooked))
            .await
        {
            Ok(beads) => beads,
            Err(_) => continue,
        };
        for bead in hooked {
            let Ok(agent) = gt_core::AgentId::parse(&bead.assignee) else {
                orphaned.push(bead.id.as_str().to_string());
                continue;
            };
            let agent_prefix = if agent.rig.is_empty() {
                String::new()
            } else {
                ctx.routes
                    .short_prefix_for_rig(&agent.rig)
                    .unwrap_or_default()
            };
            let agent_bead_id = agent.bead_id(&agent_prefix);
            let points_back = agent_hooks
                .get(&agent_bead_id)
                .is_some_and(|hook| hook == bead.id.as_str());
            if !points_back {
                orphaned.push(bead.id.as_str().to_string());
            }
        }
    }

    if orphaned.is_empty() {
        return CheckResult::ok("hooked-beads", "every hooked bead has a matching hook");
    }
    if fix {
        let mut repaired = 0;
        for id in &orphaned {
            let patch = UpdatePatch {
                status: Some(BeadStatus::Open),
                assignee: Some(String::new()),
                description: None,
            };
            if registry.update(id, &patch).await.is_ok() {
                repaired += 1;
            }
        }
        return CheckResult::ok("hooked-beads", format!("reopened {} orphan(s)", repaired));
    }
    CheckResult::warn(
        "hooked-beads",
        format!("orphaned hooked bead(s): {}", orphaned.join(", ")),
        "run `gt doctor --fix`",
    )
}
