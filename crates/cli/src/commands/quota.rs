// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt quota`

use crate::ctx::Ctx;
use crate::output::{format_age, OutputFormat};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct QuotaArgs {
    #[command(subcommand)]
    pub command: QuotaCommand,
}

#[derive(Subcommand)]
pub enum QuotaCommand {
    /// Scan sessions for rate-limit output (read-only)
    Scan,
    /// Show the LRU pairing a rotation would apply (read-only)
    Plan,
    /// Scan, plan LRU pairs, and apply the rotation
    Rotate,
    /// Flip limited/cooldown accounts back to available
    Clear {
        /// Only these handles; all when omitted
        handles: Vec<String>,
    },
    /// Accounts with status and usage times
    Status,
}

pub async fn run(ctx: &Ctx, args: QuotaArgs, format: OutputFormat) -> Result<()> {
    let rotator = ctx.rotator()?;
    match args.command {
        QuotaCommand::Scan => {
            let hits = rotator.scan().await?;
            if hits.is_empty() {
                println!("no rate-limited sessions");
                return Ok(());
            }
            for hit in &hits {
                println!(
                    "session {}: limited, account={}, resets={}",
                    hit.session,
                    hit.handle.as_deref().unwrap_or("unknown"),
                    hit.resets_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".into()),
                );
            }
            Ok(())
        }
        QuotaCommand::Plan => {
            let hits = rotator.scan().await?;
            let (_, state) = rotator.status()?;
            let plan = gt_engine::plan_rotation(&hits, &state);
            if plan.pairs.is_empty() && plan.unassigned.is_empty() {
                println!("nothing to rotate");
                return Ok(());
            }
            for (hit, handle) in &plan.pairs {
                println!(
                    "{}: {} -> {}",
                    hit.session,
                    hit.handle.as_deref().unwrap_or("unknown"),
                    handle
                );
            }
            for session in &plan.unassigned {
                println!("{}: unassigned (no available account)", session);
            }
            Ok(())
        }
        QuotaCommand::Rotate => {
            let results = rotator.rotate().await?;
            let rotated = results.iter().filter(|r| r.rotated).count();
            let unassigned = results
                .iter()
                .filter(|r| !r.rotated && r.account.is_none())
                .count();
            for result in &results {
                match (result.rotated, &result.error) {
                    (true, _) => println!(
                        "{}: rotated to {}",
                        result.session,
                        result.account.as_deref().unwrap_or("?")
                    ),
                    (false, Some(error)) => {
                        eprintln!("gt: warning: {}: {}", result.session, error)
                    }
                    (false, None) => {}
                }
            }
            println!("{} sessions rotated / {} unassigned", rotated, unassigned);
            Ok(())
        }
        QuotaCommand::Clear { handles } => {
            let filter = (!handles.is_empty()).then_some(handles);
            let cleared = rotator.clear(filter.as_deref()).await?;
            println!("{} account(s) cleared", cleared);
            Ok(())
        }
        QuotaCommand::Status => {
            let (accounts, state) = rotator.status()?;
            if let OutputFormat::Json = format {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "accounts": accounts,
                        "quota": state,
                    }))?
                );
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("HANDLE"),
                Column::left("EMAIL"),
                Column::status("STATUS"),
                Column::muted("LAST USED"),
                Column::muted("RESETS"),
            ]);
            for (handle, info) in &accounts.accounts {
                let quota = state.accounts.get(handle).cloned().unwrap_or_default();
                table.row(vec![
                    handle.clone(),
                    info.email.clone(),
                    quota.status.as_str().to_string(),
                    format_age(quota.last_used),
                    quota
                        .resets_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".into()),
                ]);
            }
            if table.is_empty() {
                println!("no accounts configured (mayor/accounts.json)");
            } else {
                print!("{}", table.render());
            }
            Ok(())
        }
    }
}
