// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warrants: recorded authorizations to terminate a named session.
//!
//! The on-disk format is stable; other tools read these files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A warrant asserting that an agent session is a zombie and should be
/// killed. Created by health monitoring, executed by the deacon cycle,
/// then retained as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warrant {
    pub id: String,
    /// Agent ID of the condemned session, e.g. `gastown/polecats/Toast`.
    pub target: String,
    pub reason: String,
    pub filed_by: String,
    pub filed_at: DateTime<Utc>,
    pub executed: bool,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Warrant {
    pub fn file(
        target: impl Into<String>,
        reason: impl Into<String>,
        filed_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::id::warrant_id(),
            target: target.into(),
            reason: reason.into(),
            filed_by: filed_by.into(),
            filed_at: now,
            executed: false,
            executed_at: None,
        }
    }

    /// Mark executed. Idempotent: a warrant with `executed=true` is
    /// never mutated again.
    pub fn mark_executed(&mut self, now: DateTime<Utc>) -> bool {
        if self.executed {
            return false;
        }
        self.executed = true;
        self.executed_at = Some(now);
        true
    }

    /// Filename in the warrants directory. Path separators in the target
    /// become dashes; filenames always end `.warrant.json`.
    pub fn filename(&self) -> String {
        format!("{}.warrant.json", self.target.replace('/', "-"))
    }
}

#[cfg(test)]
#[path = "warrant_tests.rs"]
mod tests;
