// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only activity feed: `.events.jsonl` at the town root.

use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One feed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub ts: chrono::DateTime<chrono::Utc>,
}

/// Appender for the activity feed.
#[derive(Debug, Clone)]
pub struct EventsLog {
    path: PathBuf,
}

impl EventsLog {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event. Feed failures must never fail the operation
    /// being recorded, so callers typically log and ignore the error.
    pub fn append(
        &self,
        event_type: &str,
        actor: &str,
        payload: serde_json::Value,
        ts: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let event = FeedEvent {
            event_type: event_type.to_string(),
            actor: actor.to_string(),
            payload,
            ts,
        };
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read the whole feed (doctor and tests).
    pub fn read_all(&self) -> Result<Vec<FeedEvent>, StorageError> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let mut events = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(error = %e, "skipping malformed feed line"),
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
