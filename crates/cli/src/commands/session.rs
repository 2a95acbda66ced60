// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt session`

use crate::ctx::Ctx;
use crate::output::OutputFormat;
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use gt_engine::SessionState;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Known agent sessions with liveness
    List,
}

fn state_word(state: SessionState) -> &'static str {
    match state {
        SessionState::Alive => "alive",
        SessionState::Zombie => "zombie",
        SessionState::Absent => "absent",
    }
}

pub async fn run(ctx: &Ctx, args: SessionArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        SessionCommand::List => {
            let supervisor = ctx.supervisor();
            let mut entries: Vec<(String, SessionState)> =
                supervisor.scan().await?.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            if let OutputFormat::Json = format {
                let value: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|(name, state)| {
                        serde_json::json!({
                            "session": name,
                            "state": state_word(*state),
                            "agent": ctx.registry().agent_for_bead_id(name).map(|a| a.to_string()),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("no sessions");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("SESSION"),
                Column::status("STATE"),
                Column::muted("AGENT"),
            ]);
            let registry = ctx.registry();
            for (name, state) in &entries {
                table.row(vec![
                    name.clone(),
                    state_word(*state).to_string(),
                    registry
                        .agent_for_bead_id(name)
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".into()),
                ]);
            }
            print!("{}", table.render());
            Ok(())
        }
    }
}
