// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gas Town Deacon (gtd)
//!
//! Background supervisor for one town: health cycles, warrant
//! execution, boot heartbeat. Started by `gt` or an init script; talks
//! to agents only through the issue store, warrant files, and tmux.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use gt_daemon::{Config, Deacon, LifecycleError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut interval = gt_daemon::lifecycle::DEFAULT_INTERVAL;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("gtd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "--interval" => {
                let secs: u64 = args
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or("--interval needs a number of seconds")?;
                interval = Duration::from_secs(secs);
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: gtd [--interval SECS]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load(interval)?;

    // File logging; the deacon has no terminal of its own
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, _guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let deacon = match Deacon::start(config) {
        Ok(deacon) => deacon,
        Err(LifecycleError::AlreadyRunning(path)) => {
            eprintln!("gtd: another deacon holds {}", path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    deacon.run().await?;
    Ok(())
}

fn print_help() {
    println!("gtd {}", env!("CARGO_PKG_VERSION"));
    println!("Gas Town Deacon - town-wide supervision loop");
    println!();
    println!("USAGE:");
    println!("    gtd [--interval SECS]");
    println!();
    println!("The deacon is typically started from the town root (or any");
    println!("directory inside it). One deacon runs per town.");
    println!();
    println!("OPTIONS:");
    println!("    --interval SECS  Health cycle period (default 30)");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}
