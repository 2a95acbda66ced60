// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op session adapter, for environments without a multiplexer
//! (CI, dry runs). Every query reports absence.

use super::{SessionAdapter, SessionError};
use async_trait::async_trait;
use std::path::Path;

/// Session adapter that accepts every command and does nothing.
#[derive(Clone, Default)]
pub struct NoOpSessionAdapter;

impl NoOpSessionAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionAdapter for NoOpSessionAdapter {
    async fn spawn(
        &self,
        _name: &str,
        _cwd: &Path,
        _cmd: &str,
        _env: &[(String, String)],
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn respawn(&self, _name: &str, _cmd: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn send(&self, _name: &str, _input: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn send_literal(&self, _name: &str, _text: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn send_enter(&self, _name: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn kill(&self, _name: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn has_session(&self, _name: &str) -> Result<bool, SessionError> {
        Ok(false)
    }

    async fn list_sessions(&self) -> Result<Vec<String>, SessionError> {
        Ok(Vec::new())
    }

    async fn capture_output(&self, _name: &str, _lines: u32) -> Result<String, SessionError> {
        Ok(String::new())
    }

    async fn is_process_running(&self, _name: &str, _pattern: &str) -> Result<bool, SessionError> {
        Ok(false)
    }

    async fn get_env(&self, _name: &str, _key: &str) -> Result<Option<String>, SessionError> {
        Ok(None)
    }

    async fn set_env(&self, _name: &str, _key: &str, _value: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn clear_history(&self, _name: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
