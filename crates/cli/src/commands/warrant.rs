// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt warrant`

use crate::ctx::Ctx;
use crate::output::{format_age, OutputFormat};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use gt_storage::WarrantStore;

#[derive(Args)]
pub struct WarrantArgs {
    #[command(subcommand)]
    pub command: WarrantCommand,
}

#[derive(Subcommand)]
pub enum WarrantCommand {
    /// Warrants on file, pending and executed
    List,
}

pub async fn run(ctx: &Ctx, args: WarrantArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        WarrantCommand::List => {
            let warrants = WarrantStore::at(ctx.town.warrants_dir()).list()?;
            if let OutputFormat::Json = format {
                println!("{}", serde_json::to_string_pretty(&warrants)?);
                return Ok(());
            }
            if warrants.is_empty() {
                println!("no warrants on file");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("TARGET"),
                Column::status("STATE"),
                Column::left("REASON").max(40),
                Column::muted("FILED"),
                Column::muted("BY"),
            ]);
            for warrant in &warrants {
                table.row(vec![
                    warrant.target.clone(),
                    if warrant.executed { "executed" } else { "pending" }.to_string(),
                    warrant.reason.clone(),
                    format_age(Some(warrant.filed_at)),
                    warrant.filed_by.clone(),
                ]);
            }
            print!("{}", table.render());
            Ok(())
        }
    }
}
