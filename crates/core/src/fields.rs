// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured `key: value` fields embedded in bead descriptions.
//!
//! Descriptions are a secondary key space: lines matching
//! `key: value` are fields, everything else is prose. Parsing and
//! serialization round-trip; unknown fields and prose are preserved
//! verbatim on update.

use std::fmt;

/// Well-known field names.
pub const FIELD_ATTACHED_MOLECULE: &str = "attached_molecule";
pub const FIELD_INTEGRATION_BRANCH: &str = "integration_branch";
pub const FIELD_BRANCH: &str = "branch";
pub const FIELD_TARGET: &str = "target";
pub const FIELD_SOURCE_ISSUE: &str = "source_issue";
pub const FIELD_WORKER: &str = "worker";
pub const FIELD_RIG: &str = "rig";
pub const FIELD_RETRY_COUNT: &str = "retry_count";
pub const FIELD_CONVOY_ID: &str = "convoy_id";
pub const FIELD_DELIVERED: &str = "delivered";
pub const FIELD_HEARTBEAT: &str = "heartbeat";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Field { key: String, value: String },
    Text(String),
}

/// Ordered view of a bead description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescFields {
    lines: Vec<Line>,
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    if key.is_empty()
        || !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return None;
    }
    Some((key, value.trim_start_matches(' ')))
}

impl DescFields {
    /// Parse a description. Never fails; non-field lines are kept as prose.
    pub fn parse(description: &str) -> Self {
        let lines = description
            .lines()
            .map(|line| match split_field(line) {
                Some((key, value)) => Line::Field {
                    key: key.to_string(),
                    value: value.to_string(),
                },
                None => Line::Text(line.to_string()),
            })
            .collect();
        Self { lines }
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|l| match l {
            Line::Field { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key` to `value`, replacing the first occurrence or appending
    /// a new field line at the end.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for line in &mut self.lines {
            if let Line::Field { key: k, value: v } = line {
                if k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.lines.push(Line::Field {
            key: key.to_string(),
            value,
        });
    }

    /// Remove every occurrence of `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|l| !matches!(l, Line::Field { key: k, .. } if k == key));
        self.lines.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The non-field lines, joined back into prose.
    pub fn prose(&self) -> String {
        self.lines
            .iter()
            .filter_map(|l| match l {
                Line::Text(text) => Some(text.as_str()),
                Line::Field { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterate `(key, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|l| match l {
            Line::Field { key, value } => Some((key.as_str(), value.as_str())),
            Line::Text(_) => None,
        })
    }
}

impl fmt::Display for DescFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match line {
                Line::Field { key, value } => write!(f, "{}: {}", key, value)?,
                Line::Text(text) => write!(f, "{}", text)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
