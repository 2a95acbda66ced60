// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gt-daemon: the Deacon.
//!
//! A single-threaded supervision loop over the town: each cycle runs
//! health classification, executes warrants, and keeps the boot
//! heartbeat fresh. Coordination with agents happens only through the
//! issue store, warrant files, and the multiplexer; there is no RPC
//! surface.

pub mod lifecycle;

pub use lifecycle::{Config, Deacon, LifecycleError};
