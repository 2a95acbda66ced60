// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gt-engine: the Gas Town runtime.
//!
//! Composes the adapters into the behaviors the CLI and deacon expose:
//! the typed work registry, dispatch, session supervision, health and
//! warrants, mail routing, credential rotation, the merge queue, and
//! context priming.

pub mod error;
pub mod health;
pub mod identity;
pub mod mail;
pub mod prime;
pub mod refinery;
pub mod registry;
pub mod rotate;
pub mod sling;
pub mod supervisor;

pub use error::GtError;
pub use health::{classify, HealthClass, HealthConfig, HealthMonitor, HealthReport};
pub use identity::{resolve_identity, EnvIdentity, Identity};
pub use mail::{render_inject, InjectReport, MailRouter, SendOptions, SendResult};
pub use prime::{ContextPrime, PrimeMode, PrimeOutput};
pub use refinery::{resolve_epic_branch, MrOutcome, MrReport, Refinery, RigSettings, ScoredMr};
pub use registry::Registry;
pub use rotate::{
    matches_rate_limit, parse_reset_time, plan_rotation, QuotaRotator, RotationPlan,
    RotationResult, ScanHit,
};
pub use sling::{parse_target, Sling, SlingOptions, SlingOutcome, SlingTarget};
pub use supervisor::{
    build_restart_command, session_env, EnsureOutcome, RuntimeConfig, SessionState, Supervisor,
};
