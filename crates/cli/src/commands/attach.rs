// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt attach`

use crate::ctx::Ctx;
use anyhow::{Context as _, Result};
use clap::Args;
use gt_adapters::session::attach_args;
use gt_adapters::SessionAdapter;
use gt_core::AgentId;

#[derive(Args)]
pub struct AttachArgs {
    /// Agent to attach to (e.g. `gastown/witness`, `mayor`)
    pub agent: String,
}

pub async fn run(ctx: &Ctx, args: AttachArgs) -> Result<()> {
    let agent = AgentId::parse(&args.agent)
        .map_err(|e| anyhow::anyhow!("bad agent {}: {}", args.agent, e))?;
    let session = ctx.session_for(&agent)?;

    let supervisor = ctx.supervisor();
    if !supervisor.adapter().has_session(&session).await? {
        anyhow::bail!(
            "session {} is not running; sling work to {} to start it",
            session,
            agent
        );
    }

    // Inside the multiplexer we switch the client; outside we become
    // the attached process.
    let argv = attach_args(&session, gt_adapters::env::inside_tmux());
    exec_tmux(&argv).context("tmux attach failed")
}

#[cfg(unix)]
fn exec_tmux(argv: &[String]) -> Result<()> {
    use std::os::unix::process::CommandExt;
    // exec replaces this process on success
    let err = std::process::Command::new("tmux").args(argv).exec();
    Err(err.into())
}

#[cfg(not(unix))]
fn exec_tmux(argv: &[String]) -> Result<()> {
    let status = std::process::Command::new("tmux").args(argv).status()?;
    if !status.success() {
        anyhow::bail!("tmux exited with {}", status);
    }
    Ok(())
}
