// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt sling` / `gt unsling`

use crate::ctx::Ctx;
use crate::output::OutputFormat;
use anyhow::Result;
use clap::Args;
use gt_engine::{SlingOptions, SlingOutcome};

#[derive(Args)]
pub struct SlingArgs {
    /// Bead ID, or a formula name with --on
    pub what: String,

    /// Target agent, optionally preceded by the word `to`
    /// (`gt sling gt-abc to gastown/polecats/Toast`)
    #[arg(value_name = "TARGET", num_args = 0..=2)]
    pub target: Vec<String>,

    /// Formula mode: the bead the cooked molecule attaches to
    #[arg(long)]
    pub on: Option<String>,

    /// Override the cross-rig guard
    #[arg(long)]
    pub force: bool,

    /// Skip convoy bookkeeping in formula mode
    #[arg(long = "no-convoy")]
    pub no_convoy: bool,
}

fn target_from(words: &[String]) -> Result<Option<String>> {
    match words {
        [] => Ok(None),
        [one] if one.as_str() != "to" => Ok(Some(one.clone())),
        [to, target] if to.as_str() == "to" => Ok(Some(target.clone())),
        other => anyhow::bail!("unrecognized target {:?}; write `to <agent>`", other),
    }
}

pub async fn run(ctx: &Ctx, args: SlingArgs, format: OutputFormat) -> Result<()> {
    let options = SlingOptions {
        target: target_from(&args.target)?,
        on: args.on.clone(),
        force: args.force,
        no_convoy: args.no_convoy,
    };
    let outcome = ctx.sling().sling(&args.what, &options).await?;
    match (format, &outcome) {
        (OutputFormat::Json, _) => {
            let value = match &outcome {
                SlingOutcome::Hooked {
                    bead,
                    agent,
                    session,
                    session_error,
                    spawned,
                } => serde_json::json!({
                    "result": "hooked",
                    "bead": bead,
                    "agent": agent,
                    "session": session,
                    "spawned": spawned,
                    "session_error": session_error,
                }),
                SlingOutcome::AlreadyHooked => serde_json::json!({"result": "already-hooked"}),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (
            OutputFormat::Text,
            SlingOutcome::Hooked {
                bead,
                agent,
                session,
                session_error,
                spawned,
            },
        ) => {
            println!("hooked {} to {}", bead, agent);
            if *spawned {
                println!("session {} started", session);
            }
            if let Some(error) = session_error {
                eprintln!(
                    "gt: warning: session not started ({}); the next prime will recover",
                    error
                );
            }
        }
        (OutputFormat::Text, SlingOutcome::AlreadyHooked) => {
            println!("already hooked; nothing to do");
        }
    }
    Ok(())
}

#[derive(Args)]
pub struct UnslingArgs {
    /// Bead to take off its hook
    pub bead: String,

    /// Agent holding the hook, when the bead no longer names one
    #[arg(long)]
    pub agent: Option<String>,

    /// Tolerate a missing bead (still clears the agent slot)
    #[arg(long)]
    pub force: bool,
}

pub async fn run_unsling(ctx: &Ctx, args: UnslingArgs) -> Result<()> {
    ctx.sling()
        .unsling(&args.bead, args.agent.as_deref(), args.force)
        .await?;
    println!("unslung {}", args.bead);
    Ok(())
}

#[cfg(test)]
#[path = "sling_tests.rs"]
mod tests;
