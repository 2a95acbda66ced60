// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The prefix routing table: `.beads/routes.jsonl` at the town root.
//!
//! One JSON object per line, `{"prefix":"gt-","path":"gastown/mayor/rig"}`.
//! The `hq-` prefix is reserved for the town database. Issue lookup walks
//! up from the working directory to find the routes file; a rig directory
//! must never carry its own (it would shadow the town's).

use crate::{StorageError, Town};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One routing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Prefix including the trailing dash, e.g. `gt-`.
    pub prefix: String,
    /// Database directory relative to the town root (`.` for the town DB).
    pub path: String,
}

/// The loaded routing table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    town_root: PathBuf,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Load the table from a town. A missing routes file yields an empty
    /// table (only `hq-` resolves).
    pub fn load(town: &Town) -> Result<Self, StorageError> {
        let path = town.routes_path();
        let mut routes = Vec::new();
        if path.is_file() {
            let file = std::fs::File::open(&path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Route>(&line) {
                    Ok(route) => routes.push(route),
                    Err(e) => {
                        tracing::warn!(%line, error = %e, "skipping malformed route line");
                    }
                }
            }
        }
        Ok(Self {
            town_root: town.root().to_path_buf(),
            routes,
        })
    }

    /// Walk up from `start` to find the routes file, then load it.
    ///
    /// Fails with [`StorageError::ShadowingRoutes`] when the nearest
    /// routes file is not at a town root.
    pub fn discover(start: &Path) -> Result<Self, StorageError> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            if d.join(".beads").join("routes.jsonl").is_file() {
                let mayor = d.join("mayor");
                if !(mayor.join("town.json").is_file() || mayor.is_dir()) {
                    return Err(StorageError::ShadowingRoutes(
                        d.join(".beads").join("routes.jsonl"),
                    ));
                }
                return Self::load(&Town::at(d));
            }
            dir = d.parent();
        }
        // Fall back to town discovery (env var included)
        let town = Town::discover(start)?;
        Self::load(&town)
    }

    /// Resolve a prefix (with trailing dash) to its database directory.
    ///
    /// `hq-` always maps to the town database.
    pub fn resolve(&self, prefix: &str) -> Result<PathBuf, StorageError> {
        if prefix == "hq-" {
            if let Some(route) = self.routes.iter().find(|r| r.prefix == "hq-") {
                return Ok(self.absolute(&route.path));
            }
            return Ok(self.town_root.clone());
        }
        self.routes
            .iter()
            .find(|r| r.prefix == prefix)
            .map(|r| self.absolute(&r.path))
            .ok_or_else(|| StorageError::UnknownPrefix(prefix.to_string()))
    }

    /// Resolve the database directory owning a bead ID.
    pub fn resolve_bead(&self, bead_id: &str) -> Result<PathBuf, StorageError> {
        let prefix = bead_id
            .split_once('-')
            .map(|(p, _)| format!("{}-", p))
            .ok_or_else(|| StorageError::UnknownPrefix(bead_id.to_string()))?;
        self.resolve(&prefix)
    }

    /// The rig (first path component) owning a prefix; `None` for `hq-`
    /// and for paths directly at the town root.
    pub fn rig_of(&self, prefix: &str) -> Option<String> {
        if prefix == "hq-" {
            return None;
        }
        let route = self.routes.iter().find(|r| r.prefix == prefix)?;
        let first = Path::new(&route.path).components().next()?;
        match first {
            std::path::Component::Normal(c) => {
                let s = c.to_string_lossy().to_string();
                (s != ".").then_some(s)
            }
            _ => None,
        }
    }

    /// The registered prefix (with dash) for a rig, scanning route paths.
    pub fn prefix_for_rig(&self, rig: &str) -> Option<String> {
        self.routes
            .iter()
            .find(|r| {
                Path::new(&r.path)
                    .components()
                    .next()
                    .is_some_and(|c| c.as_os_str() == rig)
            })
            .map(|r| r.prefix.clone())
    }

    /// The bare prefix (no dash) for a rig, for building session names.
    pub fn short_prefix_for_rig(&self, rig: &str) -> Option<String> {
        self.prefix_for_rig(rig)
            .map(|p| p.trim_end_matches('-').to_string())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Append a route line to the town's routes file. Refuses duplicate
    /// prefixes (a routing conflict would break containment).
    pub fn append_route(town: &Town, prefix: &str, path: &str) -> Result<(), StorageError> {
        let table = Self::load(town)?;
        if table.routes.iter().any(|r| r.prefix == prefix) {
            return Err(StorageError::RouteConflict(prefix.to_string()));
        }
        let routes_path = town.routes_path();
        if let Some(parent) = routes_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&routes_path)?;
        let route = Route {
            prefix: prefix.to_string(),
            path: path.to_string(),
        };
        let mut line = serde_json::to_string(&route)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn absolute(&self, rel: &str) -> PathBuf {
        if rel == "." {
            self.town_root.clone()
        } else {
            self.town_root.join(rel)
        }
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
