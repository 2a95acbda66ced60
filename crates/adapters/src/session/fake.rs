// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake session adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SessionAdapter, SessionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded session call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Spawn {
        name: String,
        cwd: PathBuf,
        cmd: String,
        env: Vec<(String, String)>,
    },
    Respawn {
        name: String,
        cmd: String,
    },
    Send {
        name: String,
        input: String,
    },
    SendLiteral {
        name: String,
        text: String,
    },
    SendEnter {
        name: String,
    },
    Kill {
        name: String,
    },
    SetEnv {
        name: String,
        key: String,
        value: String,
    },
    ClearHistory {
        name: String,
    },
}

/// Fake session state
#[derive(Debug, Clone)]
pub struct FakeSession {
    pub name: String,
    pub cwd: PathBuf,
    pub cmd: String,
    pub env: HashMap<String, String>,
    pub output: String,
    pub alive: bool,
    pub process_running: bool,
}

#[derive(Default)]
struct FakeSessionState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<SessionCall>,
    /// Session names whose `set_env` calls fail, for partial-failure tests.
    refuse_env: Vec<String>,
}

/// Fake session adapter for testing
#[derive(Clone, Default)]
pub struct FakeSessionAdapter {
    inner: Arc<Mutex<FakeSessionState>>,
}

impl FakeSessionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    /// Get a session by name
    pub fn get_session(&self, name: &str) -> Option<FakeSession> {
        self.inner.lock().sessions.get(name).cloned()
    }

    /// Install a session without going through spawn.
    pub fn add_session(&self, session: FakeSession) {
        self.inner
            .lock()
            .sessions
            .insert(session.name.clone(), session);
    }

    /// Set the captured pane output for a session.
    pub fn set_output(&self, name: &str, output: impl Into<String>) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.output = output.into();
        }
    }

    /// Mark whether the agent process runs inside a session.
    pub fn set_process_running(&self, name: &str, running: bool) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.process_running = running;
        }
    }

    /// Make `set_env` fail for one session, like a multiplexer refusal.
    pub fn refuse_env_for(&self, name: &str) {
        self.inner.lock().refuse_env.push(name.to_string());
    }
}

impl FakeSession {
    pub fn alive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cwd: PathBuf::new(),
            cmd: String::new(),
            env: HashMap::new(),
            output: String::new(),
            alive: true,
            process_running: true,
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn zombie(name: &str) -> Self {
        let mut s = Self::alive(name);
        s.process_running = false;
        s
    }
}

#[async_trait]
impl SessionAdapter for FakeSessionAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::Spawn {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
            env: env.to_vec(),
        });
        state.sessions.insert(
            name.to_string(),
            FakeSession {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                cmd: cmd.to_string(),
                env: env.iter().cloned().collect(),
                output: String::new(),
                alive: true,
                process_running: true,
            },
        );
        Ok(())
    }

    async fn respawn(&self, name: &str, cmd: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::Respawn {
            name: name.to_string(),
            cmd: cmd.to_string(),
        });
        match state.sessions.get_mut(name) {
            Some(session) => {
                session.cmd = cmd.to_string();
                session.alive = true;
                session.process_running = true;
                Ok(())
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn send(&self, name: &str, input: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::Send {
            name: name.to_string(),
            input: input.to_string(),
        });
        if state.sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }

    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::SendLiteral {
            name: name.to_string(),
            text: text.to_string(),
        });
        if state.sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }

    async fn send_enter(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::SendEnter {
            name: name.to_string(),
        });
        if state.sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }

    async fn kill(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::Kill {
            name: name.to_string(),
        });
        state.sessions.remove(name);
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, SessionError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(name)
            .is_some_and(|s| s.alive))
    }

    async fn list_sessions(&self) -> Result<Vec<String>, SessionError> {
        let state = self.inner.lock();
        let mut names: Vec<String> = state
            .sessions
            .values()
            .filter(|s| s.alive)
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn capture_output(&self, name: &str, _lines: u32) -> Result<String, SessionError> {
        self.inner
            .lock()
            .sessions
            .get(name)
            .map(|s| s.output.clone())
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    async fn is_process_running(&self, name: &str, _pattern: &str) -> Result<bool, SessionError> {
        self.inner
            .lock()
            .sessions
            .get(name)
            .map(|s| s.process_running)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, SessionError> {
        self.inner
            .lock()
            .sessions
            .get(name)
            .map(|s| s.env.get(key).cloned())
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        if state.refuse_env.iter().any(|n| n == name) {
            return Err(SessionError::CommandFailed(format!(
                "environment refused for {}",
                name
            )));
        }
        state.calls.push(SessionCall::SetEnv {
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        match state.sessions.get_mut(name) {
            Some(session) => {
                session.env.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn clear_history(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.calls.push(SessionCall::ClearHistory {
            name: name.to_string(),
        });
        if state.sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
