// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux session adapter

use super::{SessionAdapter, SessionError};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-based session adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn tmux(args: &[&str], description: &str) -> Result<std::process::Output, SessionError> {
    let mut cmd = Command::new("tmux");
    cmd.args(args);
    run_with_timeout(cmd, TMUX_TIMEOUT, description)
        .await
        .map_err(SessionError::CommandFailed)
}

#[async_trait]
impl SessionAdapter for TmuxAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), SessionError> {
        // Precondition: cwd must exist
        if !cwd.exists() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        // A leftover session under this name is dead weight; replace it
        if self.has_session(name).await? {
            tracing::warn!(session = name, "session already exists, killing first");
            self.kill(name).await?;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(name)
            .arg("-c")
            .arg(cwd);

        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{}={}", key, value));
        }

        tmux_cmd.arg(cmd);

        let output = run_with_timeout(tmux_cmd, TMUX_TIMEOUT, "tmux new-session")
            .await
            .map_err(SessionError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                session = name,
                stderr = %stderr,
                "tmux spawn failed"
            );
            return Err(SessionError::SpawnFailed(stderr.to_string()));
        }

        // Log stderr even on success - may contain useful warnings
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                session = name,
                stderr = %stderr,
                "tmux spawn stderr (non-fatal)"
            );
        }

        Ok(())
    }

    async fn respawn(&self, name: &str, cmd: &str) -> Result<(), SessionError> {
        let output = tmux(
            &["respawn-pane", "-k", "-t", name, cmd],
            "tmux respawn-pane",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send(&self, name: &str, input: &str) -> Result<(), SessionError> {
        let output = tmux(&["send-keys", "-t", name, input], "tmux send-keys").await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = tmux(
            &["send-keys", "-t", name, "-l", "--", text],
            "tmux send-keys -l",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, name: &str) -> Result<(), SessionError> {
        let output = tmux(&["send-keys", "-t", name, "Enter"], "tmux send-keys Enter").await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), SessionError> {
        let output = tmux(&["kill-session", "-t", name], "tmux kill-session").await?;
        if !output.status.success() {
            // Session might already be dead, which is fine
        }
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, SessionError> {
        let output = tmux(&["has-session", "-t", name], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, SessionError> {
        let output = tmux(
            &["list-sessions", "-F", "#{session_name}"],
            "tmux list-sessions",
        )
        .await?;
        if !output.status.success() {
            // No server running means no sessions
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    async fn capture_output(&self, name: &str, lines: u32) -> Result<String, SessionError> {
        let start = format!("-{}", lines);
        let output = tmux(
            &["capture-pane", "-t", name, "-p", "-S", &start],
            "tmux capture-pane",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn is_process_running(&self, name: &str, pattern: &str) -> Result<bool, SessionError> {
        // Get the pane PID
        let output = tmux(
            &["list-panes", "-t", name, "-F", "#{pane_pid}"],
            "tmux list-panes",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }

        let pane_pid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane_pid.is_empty() {
            return Ok(false);
        }

        // Run both checks concurrently: the pane process itself and its children.
        // - ps: checks if the pane process matches (tmux may exec the command directly)
        // - pgrep: checks child processes (when run via a shell)
        let (ps_output, pgrep_output) = tokio::try_join!(
            async {
                Command::new("ps")
                    .args(["-p", &pane_pid, "-o", "command="])
                    .output()
                    .await
                    .map_err(|e| SessionError::CommandFailed(e.to_string()))
            },
            async {
                Command::new("pgrep")
                    .args(["-P", &pane_pid, "-f", pattern])
                    .output()
                    .await
                    .map_err(|e| SessionError::CommandFailed(e.to_string()))
            },
        )?;

        // Check if the pane process itself matches the pattern
        if ps_output.status.success() {
            let cmd_line = String::from_utf8_lossy(&ps_output.stdout);
            if cmd_line.contains(pattern) {
                return Ok(true);
            }
        }

        // Check if any child process matches
        Ok(pgrep_output.status.success())
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, SessionError> {
        let output = tmux(
            &["show-environment", "-t", name, key],
            "tmux show-environment",
        )
        .await?;
        if !output.status.success() {
            // Unset variables exit non-zero; distinguish from a dead session
            if self.has_session(name).await? {
                return Ok(None);
            }
            return Err(SessionError::NotFound(name.to_string()));
        }
        let line = String::from_utf8_lossy(&output.stdout);
        Ok(line
            .trim_end()
            .split_once('=')
            .map(|(_, value)| value.to_string()))
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), SessionError> {
        let output = tmux(
            &["set-environment", "-t", name, key, value],
            "tmux set-environment",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn clear_history(&self, name: &str) -> Result<(), SessionError> {
        let output = tmux(&["clear-history", "-t", name], "tmux clear-history").await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

/// Arguments for attaching the current terminal to a session.
///
/// Inside the multiplexer, attaching means switching the client; outside,
/// the caller replaces its process with `attach-session`. UTF-8 is forced
/// via `-u` to avoid locale-dependent rendering.
pub fn attach_args(name: &str, inside_tmux: bool) -> Vec<String> {
    if inside_tmux {
        vec!["switch-client".into(), "-t".into(), name.into()]
    } else {
        vec![
            "-u".into(),
            "attach-session".into(),
            "-t".into(),
            name.into(),
        ]
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
