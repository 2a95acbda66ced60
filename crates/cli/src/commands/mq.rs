// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt mq`

use crate::ctx::Ctx;
use crate::output::{format_age, OutputFormat};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use gt_adapters::git::GitAdapter;
use gt_engine::MrOutcome;

#[derive(Args)]
pub struct MqArgs {
    /// Rig whose queue to operate on (default: the rig in scope)
    #[arg(long, global = true)]
    pub rig: Option<String>,

    #[command(subcommand)]
    pub command: MqCommand,
}

#[derive(Subcommand)]
pub enum MqCommand {
    /// Show the scored queue
    List {
        /// Also confirm each source branch still exists
        #[arg(long)]
        verify: bool,
    },
    /// Drain the queue once, best score first
    Process,
}

fn git_for(ctx: &Ctx, rig: &str) -> GitAdapter {
    GitAdapter::in_repo(ctx.town.rig_dir(rig).join("refinery").join("rig"))
}

pub async fn run(ctx: &Ctx, args: MqArgs, format: OutputFormat) -> Result<()> {
    let (rig, prefix) = ctx.rig_and_prefix(args.rig.as_deref())?;
    let refinery = ctx.refinery(&rig, &prefix);
    match args.command {
        MqCommand::List { verify } => {
            let rows: Vec<(gt_engine::ScoredMr, Option<bool>)> = if verify {
                refinery
                    .verify(&git_for(ctx, &rig))
                    .await?
                    .into_iter()
                    .map(|(scored, exists)| (scored, Some(exists)))
                    .collect()
            } else {
                refinery
                    .queue()
                    .await?
                    .into_iter()
                    .map(|scored| (scored, None))
                    .collect()
            };

            if let OutputFormat::Json = format {
                let value: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(scored, exists)| {
                        serde_json::json!({
                            "id": scored.mr.id,
                            "branch": scored.mr.branch,
                            "score": scored.score,
                            "retries": scored.mr.retry_count,
                            "branch_exists": exists,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            if rows.is_empty() {
                println!("merge queue for {} is empty", rig);
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("MR"),
                Column::right("SCORE"),
                Column::left("BRANCH").max(40),
                Column::right("RETRIES"),
                Column::muted("AGE"),
                Column::status("REF"),
            ]);
            for (scored, exists) in &rows {
                table.row(vec![
                    scored.mr.id.clone(),
                    scored.score.to_string(),
                    scored.mr.branch.clone(),
                    scored.mr.retry_count.to_string(),
                    format_age(scored.mr.created_at),
                    match exists {
                        Some(true) => "ok".to_string(),
                        Some(false) => "missing".to_string(),
                        None => "-".to_string(),
                    },
                ]);
            }
            print!("{}", table.render());
            Ok(())
        }
        MqCommand::Process => {
            let reports = refinery.process(&git_for(ctx, &rig)).await?;
            if reports.is_empty() {
                println!("merge queue for {} is empty", rig);
            }
            for report in &reports {
                match &report.outcome {
                    MrOutcome::Merged { target } => {
                        println!("{}: merged into {}", report.id, target)
                    }
                    MrOutcome::Requeued { retries } => {
                        println!("{}: conflict, requeued (retry {})", report.id, retries)
                    }
                    MrOutcome::Blocked { reason } => {
                        println!("{}: blocked ({})", report.id, reason)
                    }
                }
            }
            Ok(())
        }
    }
}
