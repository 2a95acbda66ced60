// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Gas Town: everything the core persists under the
//! town root, plus discovery of the town root itself.

mod accounts;
mod events;
mod locks;
mod quota_file;
mod rigs;
mod routes;
mod town;
mod warrants;

pub use accounts::AccountsFile;
pub use events::{EventsLog, FeedEvent};
pub use locks::{pid_alive, IdentityLock, LockHolder};
pub use quota_file::{QuotaFile, QuotaGuard};
pub use rigs::{BeadsConfig, RigEntry, RigRegistry};
pub use routes::{Route, RouteTable};
pub use town::Town;
pub use warrants::WarrantStore;

use std::io;
use thiserror::Error;

/// Errors from town storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no town found walking up from {0} (set GT_TOWN_ROOT or run inside a town)")]
    NoTown(std::path::PathBuf),
    #[error("no route for prefix {0} (check .beads/routes.jsonl)")]
    UnknownPrefix(String),
    #[error("prefix {0} is already routed")]
    RouteConflict(String),
    #[error("a rig must not carry its own routes file: {0} shadows the town's")]
    ShadowingRoutes(std::path::PathBuf),
    #[error("identity lock held by pid {pid} (session {session_id}, since {acquired_at})")]
    LockHeld {
        pid: u32,
        session_id: String,
        acquired_at: String,
    },
    #[error("quota state is locked by another rotation cycle")]
    QuotaLocked,
}

pub(crate) fn atomic_write_json<T: serde::Serialize>(
    path: &std::path::Path,
    value: &T,
) -> Result<(), StorageError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
