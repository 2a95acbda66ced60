// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt mail`

use crate::ctx::Ctx;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use anyhow::Result;
use clap::{Args, Subcommand};
use gt_core::{MailType, Priority};
use gt_engine::SendOptions;

#[derive(Args)]
pub struct MailArgs {
    #[command(subcommand)]
    pub command: MailCommand,
}

#[derive(Subcommand)]
pub enum MailCommand {
    /// Send a message
    Send {
        /// Recipients: agent IDs, `group:`/`queue:`/`channel:` names,
        /// `@town`, `@crew`, `@witnesses`, `@overseer`, `--human`, `--self`
        #[arg(required = true, allow_hyphen_values = true)]
        to: Vec<String>,

        #[arg(short, long)]
        subject: String,

        /// Message body
        #[arg(short = 'm', long, default_value = "")]
        message: String,

        /// urgent | high | normal | low
        #[arg(long, default_value = "normal")]
        priority: String,

        #[arg(long)]
        cc: Vec<String>,

        /// Message ID this replies to (threads through the sender's mailbox)
        #[arg(long = "reply-to")]
        reply_to: Option<String>,

        /// Ephemeral message
        #[arg(long)]
        wisp: bool,

        /// Survive the ephemeral purge
        #[arg(long)]
        pinned: bool,

        /// Skip the desktop notification
        #[arg(long = "suppress-notify")]
        suppress_notify: bool,
    },
    /// List unread mail (pure read, acks nothing)
    Inbox,
    /// Check for unread mail; exit 0 when some exists, 1 when none
    Check {
        /// Emit the tiered system-reminder block and mark it delivered
        #[arg(long)]
        inject: bool,
    },
}

pub async fn run(ctx: &Ctx, args: MailArgs, format: OutputFormat) -> Result<()> {
    let router = ctx.router();
    match args.command {
        MailCommand::Send {
            to,
            subject,
            message,
            priority,
            cc,
            reply_to,
            wisp,
            pinned,
            suppress_notify,
        } => {
            let priority = Priority::parse(&priority)
                .ok_or_else(|| anyhow::anyhow!("bad priority {priority}; use urgent|high|normal|low"))?;
            let options = SendOptions {
                priority,
                mail_type: if reply_to.is_some() {
                    MailType::Reply
                } else {
                    MailType::Notification
                },
                cc,
                reply_to,
                wisp,
                pinned,
                suppress_notify,
            };
            let results = router.send(&to, &subject, &message, &options).await?;
            let delivered = results.iter().filter(|r| r.ok).count();
            for result in results.iter().filter(|r| !r.ok) {
                eprintln!(
                    "gt: warning: {} not reached: {}",
                    result.recipient,
                    result.error.as_deref().unwrap_or("unknown")
                );
            }
            println!("sent to {} recipient(s)", delivered);
            Ok(())
        }
        MailCommand::Inbox => {
            let messages = router.inbox(&ctx.actor).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&messages)?);
                }
                OutputFormat::Text => {
                    if messages.is_empty() {
                        println!("inbox empty");
                    }
                    for envelope in &messages {
                        println!(
                            "[{}] {} from {}: {}",
                            envelope.priority, envelope.id, envelope.from, envelope.subject
                        );
                    }
                }
            }
            Ok(())
        }
        MailCommand::Check { inject } => {
            if inject {
                match router.check_inject(&ctx.actor).await? {
                    Some(report) => {
                        println!("{}", report.text);
                        Ok(())
                    }
                    None => Err(ExitError::silent(1)),
                }
            } else {
                let messages = router.inbox(&ctx.actor).await?;
                if messages.is_empty() {
                    Err(ExitError::silent(1))
                } else {
                    println!("{} unread message(s)", messages.len());
                    Ok(())
                }
            }
        }
    }
}
