// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt prime`

use crate::ctx::Ctx;
use anyhow::Result;
use clap::Args;
use gt_engine::{EnvIdentity, PrimeMode};
use std::io::{IsTerminal, Read};

#[derive(Args)]
pub struct PrimeArgs {
    /// Hook source (`compact` / `resume`); otherwise read from stdin
    #[arg(long)]
    pub source: Option<String>,
}

/// Hook input piped on stdin by the agent runtime.
#[derive(serde::Deserialize, Default)]
struct HookInput {
    #[serde(default, alias = "hook_source")]
    source: Option<String>,
}

fn stdin_source() -> Option<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buffer = String::new();
    if stdin.lock().read_to_string(&mut buffer).is_err() || buffer.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<HookInput>(&buffer)
        .ok()
        .and_then(|input| input.source)
}

pub async fn run(ctx: &Ctx, args: PrimeArgs) -> Result<()> {
    let source = args.source.or_else(stdin_source);
    let mode = PrimeMode::from_hook_source(source.as_deref());
    let session_id = gt_adapters::env::session_id()
        .unwrap_or_else(|| gt_core::id::thread_id()[..12].to_string());
    // The agent CLI hosts this prompt; its pid is our parent's
    let agent_pid = parent_pid().unwrap_or_else(std::process::id);

    let output = ctx
        .prime()
        .run(
            mode,
            &EnvIdentity::from_process(),
            &ctx.cwd,
            &session_id,
            agent_pid,
        )
        .await?;
    for warning in &output.warnings {
        eprintln!("gt: warning: {}", warning);
    }
    println!("{}", output.text.trim_end());
    Ok(())
}

#[cfg(unix)]
fn parent_pid() -> Option<u32> {
    Some(std::os::unix::process::parent_id())
}

#[cfg(not(unix))]
fn parent_pid() -> Option<u32> {
    None
}
