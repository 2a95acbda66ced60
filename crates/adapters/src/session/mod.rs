// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session management adapters

mod noop;
mod tmux;

pub use noop::NoOpSessionAdapter;
pub use tmux::{attach_args, TmuxAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSession, FakeSessionAdapter, SessionCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for managing terminal sessions (tmux semantics).
///
/// Session names are the caller's concern; the adapter never rewrites
/// them. One pane per session is assumed throughout.
#[async_trait]
pub trait SessionAdapter: Clone + Send + Sync + 'static {
    /// Create a detached session running `cmd` in `cwd`.
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), SessionError>;

    /// Replace the running command of an existing session's pane.
    async fn respawn(&self, name: &str, cmd: &str) -> Result<(), SessionError>;

    /// Send input to a session (key-name interpretation applies)
    async fn send(&self, name: &str, input: &str) -> Result<(), SessionError>;

    /// Send literal text to a session (no key name interpretation)
    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError>;

    /// Send the Enter key to a session
    async fn send_enter(&self, name: &str) -> Result<(), SessionError>;

    /// Kill a session. Killing an absent session is not an error.
    async fn kill(&self, name: &str) -> Result<(), SessionError>;

    /// Check whether the multiplexer lists this session.
    async fn has_session(&self, name: &str) -> Result<bool, SessionError>;

    /// All session names the multiplexer currently lists.
    async fn list_sessions(&self) -> Result<Vec<String>, SessionError>;

    /// Capture recent output from a session's pane.
    async fn capture_output(&self, name: &str, lines: u32) -> Result<String, SessionError>;

    /// Check if a process matching pattern is running inside the session
    async fn is_process_running(&self, name: &str, pattern: &str) -> Result<bool, SessionError>;

    /// Read one variable from the session's environment.
    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, SessionError>;

    /// Set one variable in the session's environment.
    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), SessionError>;

    /// Drop the pane's scrollback.
    async fn clear_history(&self, name: &str) -> Result<(), SessionError>;
}
