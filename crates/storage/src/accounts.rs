// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential accounts file: `mayor/accounts.json`.

use crate::{atomic_write_json, StorageError};
use gt_core::AccountsConfig;
use std::path::{Path, PathBuf};

/// Loader/saver for the accounts config.
#[derive(Debug, Clone)]
pub struct AccountsFile {
    path: PathBuf,
}

impl AccountsFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; a missing file is an empty pool.
    pub fn load(&self) -> Result<AccountsConfig, StorageError> {
        if !self.path.is_file() {
            return Ok(AccountsConfig::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, config: &AccountsConfig) -> Result<(), StorageError> {
        atomic_write_json(&self.path, config)
    }
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
