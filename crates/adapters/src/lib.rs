// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for Gas Town's external collaborators: the tmux multiplexer,
//! the `bd` issue store, git, the dolt SQL server, and notifications.

pub mod beads;
pub mod dolt;
pub mod env;
pub mod git;
pub mod notify;
pub mod session;
pub mod subprocess;

pub use beads::{
    BdCli, BeadsAdapter, BeadsError, CreateOpts, ListFilter, MoleculeStep, Slots, UpdatePatch,
};
pub use dolt::{DoltServer, DoltStatus};
pub use git::{GitAdapter, MergeOutcome};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use session::{NoOpSessionAdapter, SessionAdapter, SessionError, TmuxAdapter};

#[cfg(any(test, feature = "test-support"))]
pub use beads::FakeBeads;
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeSession, FakeSessionAdapter, SessionCall};
