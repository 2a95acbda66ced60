// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dolt SQL server lifecycle.
//!
//! Rotation, migration, and sync all follow the same discipline: stop
//! the server, do the work, restart. Callers use [`DoltServer::stop`] /
//! [`DoltServer::start`] explicitly and must restart on every exit path.

use crate::subprocess::{run_with_timeout, DOLT_TIMEOUT};
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum DoltError {
    #[error("dolt command failed: {0}")]
    CommandFailed(String),
    #[error("dolt version {found} is below the required {required}")]
    VersionTooOld { found: String, required: String },
}

/// Observed server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoltStatus {
    Running,
    Stopped,
    /// The server answers but rejects writes; recovery is stop + start.
    ReadOnly,
}

/// Handle on the dolt server backing the issue databases.
#[derive(Clone)]
pub struct DoltServer {
    data_dir: PathBuf,
    required_version: String,
}

impl DoltServer {
    pub fn at(data_dir: impl Into<PathBuf>, required_version: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            required_version: required_version.into(),
        }
    }

    async fn dolt(&self, args: &[&str]) -> Result<std::process::Output, DoltError> {
        let mut cmd = Command::new("dolt");
        cmd.args(args).current_dir(&self.data_dir);
        run_with_timeout(cmd, DOLT_TIMEOUT, "dolt")
            .await
            .map_err(DoltError::CommandFailed)
    }

    async fn sql(&self, query: &str) -> Result<std::process::Output, DoltError> {
        self.dolt(&["sql", "-q", query]).await
    }

    /// Verify the installed dolt meets the configured minimum.
    pub async fn check_version(&self) -> Result<String, DoltError> {
        let output = self.dolt(&["version"]).await?;
        let found = String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .last()
            .unwrap_or("")
            .to_string();
        if version_lt(&found, &self.required_version) {
            return Err(DoltError::VersionTooOld {
                found,
                required: self.required_version.clone(),
            });
        }
        Ok(found)
    }

    pub async fn start(&self) -> Result<(), DoltError> {
        let output = self.dolt(&["sql-server", "--daemon"]).await?;
        if !output.status.success() {
            return Err(DoltError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), DoltError> {
        let output = self.dolt(&["sql-server", "--stop"]).await?;
        if !output.status.success() {
            // Stopping a stopped server is fine
            tracing::debug!("dolt stop on non-running server");
        }
        Ok(())
    }

    /// Probe the server state with a harmless write to a scratch table.
    pub async fn status(&self) -> Result<DoltStatus, DoltError> {
        let probe = self.sql("SELECT 1").await?;
        if !probe.status.success() {
            return Ok(DoltStatus::Stopped);
        }
        let write_probe = self
            .sql("CREATE TABLE IF NOT EXISTS __gt_probe (id INT); DROP TABLE __gt_probe")
            .await?;
        if write_probe.status.success() {
            Ok(DoltStatus::Running)
        } else {
            let stderr = String::from_utf8_lossy(&write_probe.stderr);
            if stderr.contains("read-only") || stderr.contains("read only") {
                Ok(DoltStatus::ReadOnly)
            } else {
                Ok(DoltStatus::Running)
            }
        }
    }

    pub async fn list_databases(&self) -> Result<Vec<String>, DoltError> {
        let output = self.sql("SHOW DATABASES").await?;
        if !output.status.success() {
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().trim_matches('|').trim().to_string())
            .filter(|l| {
                !l.is_empty()
                    && *l != "Database"
                    && !l.starts_with('+')
                    && *l != "information_schema"
                    && *l != "mysql"
            })
            .collect())
    }

    /// A database is served when its directory exists AND the server
    /// answers `USE <db>`.
    pub async fn is_served(&self, db_name: &str) -> Result<bool, DoltError> {
        if !self.data_dir.join(db_name).is_dir() {
            return Ok(false);
        }
        let output = self.sql(&format!("USE `{}`", db_name)).await?;
        Ok(output.status.success())
    }

    /// Recover a read-only server by bouncing it.
    pub async fn ensure_writable(&self) -> Result<DoltStatus, DoltError> {
        let status = self.status().await?;
        if status == DoltStatus::ReadOnly {
            tracing::warn!("dolt server is read-only, restarting");
            self.stop().await?;
            self.start().await?;
            return self.status().await;
        }
        Ok(status)
    }
}

/// Lexicographic-by-component version comparison, enough for `x.y.z`.
fn version_lt(found: &str, required: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|c| c.parse().unwrap_or(0))
            .collect()
    };
    parse(found) < parse(required)
}

#[cfg(test)]
#[path = "dolt_tests.rs"]
mod tests;
