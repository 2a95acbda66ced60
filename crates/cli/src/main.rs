// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gt - Gas Town CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod ctx;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{attach, doctor, mail, mq, prime, quota, session, sling, warrant};
use ctx::Ctx;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gt",
    version,
    styles = color::styles(),
    about = "Gas Town - fleet orchestration for autonomous agents"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach work (or a formula) to an agent's hook
    Sling(sling::SlingArgs),
    /// Clear an agent's hook and reopen the bead
    Unsling(sling::UnslingArgs),
    /// Emit the agent context for this session
    Prime(prime::PrimeArgs),
    /// Attach the terminal to an agent's session
    Attach(attach::AttachArgs),
    /// Inter-agent mail
    Mail(mail::MailArgs),
    /// Merge queue
    Mq(mq::MqArgs),
    /// Credential pool
    Quota(quota::QuotaArgs),
    /// Agent sessions
    Session(session::SessionArgs),
    /// Warrants on file
    Warrant(warrant::WarrantArgs),
    /// Detect (and fix) the recurring failure modes
    Doctor(doctor::DoctorArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        exit_error::exit_with(error);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Ctx::load(cli.directory.as_deref())?;
    if ctx.identity_mismatch {
        eprintln!("gt: warning: GT_ROLE disagrees with the working directory; trusting GT_ROLE");
    }
    match cli.command {
        Commands::Sling(args) => sling::run(&ctx, args, cli.output).await,
        Commands::Unsling(args) => sling::run_unsling(&ctx, args).await,
        Commands::Prime(args) => prime::run(&ctx, args).await,
        Commands::Attach(args) => attach::run(&ctx, args).await,
        Commands::Mail(args) => mail::run(&ctx, args, cli.output).await,
        Commands::Mq(args) => mq::run(&ctx, args, cli.output).await,
        Commands::Quota(args) => quota::run(&ctx, args, cli.output).await,
        Commands::Session(args) => session::run(&ctx, args, cli.output).await,
        Commands::Warrant(args) => warrant::run(&ctx, args, cli.output).await,
        Commands::Doctor(args) => doctor::run(&ctx, args).await,
    }
}
