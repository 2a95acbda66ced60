// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deacon lifecycle: PID lock, logging, the supervision loop, and the
//! boot heartbeat task.

use fs2::FileExt;
use gt_adapters::{BdCli, TmuxAdapter, UpdatePatch};
use gt_core::fields::FIELD_HEARTBEAT;
use gt_core::{AgentId, DescFields, SystemClock};
use gt_engine::{HealthConfig, HealthMonitor, Registry, Supervisor};
use gt_storage::{RouteTable, StorageError, Town};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Default cycle period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("another deacon is already running (lock at {0})")]
    AlreadyRunning(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deacon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub town_root: PathBuf,
    pub interval: Duration,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
}

impl Config {
    /// Discover the town from the working directory and derive paths.
    pub fn load(interval: Duration) -> Result<Self, LifecycleError> {
        let cwd = std::env::current_dir()?;
        let town = Town::discover(&cwd)?;
        Ok(Self {
            town_root: town.root().to_path_buf(),
            interval,
            log_path: town.deacon_log_path(),
            pid_path: town.deacon_pid_path(),
        })
    }
}

/// The running deacon: health monitor plus its exclusive PID lock.
pub struct Deacon {
    config: Config,
    town: Town,
    monitor: HealthMonitor<BdCli, TmuxAdapter, SystemClock>,
    registry: Registry<BdCli>,
    // NOTE(lifetime): held to maintain the exclusive PID lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl Deacon {
    /// Acquire the PID lock and build the monitor. Fails fast when a
    /// deacon already runs for this town.
    pub fn start(config: Config) -> Result<Self, LifecycleError> {
        if let Some(parent) = config.pid_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_file = File::create(&config.pid_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| LifecycleError::AlreadyRunning(config.pid_path.clone()))?;
        std::io::Write::write_all(
            &mut &lock_file,
            format!("{}\n", std::process::id()).as_bytes(),
        )?;

        let town = Town::at(&config.town_root);
        let routes = RouteTable::load(&town)?;
        let actor = AgentId::deacon().to_string();
        let registry = Registry::new(routes, BdCli::new(&actor));
        let supervisor = Supervisor::new(TmuxAdapter::new());
        let monitor = HealthMonitor::new(
            registry.clone(),
            supervisor,
            town.clone(),
            SystemClock,
            HealthConfig::default(),
            actor,
        );
        Ok(Self {
            config,
            town,
            monitor,
            registry,
            lock_file,
        })
    }

    pub fn town(&self) -> &Town {
        &self.town
    }

    /// Run until SIGTERM/SIGINT. One health cycle per tick; the boot
    /// heartbeat rides its own task at half the cycle period.
    pub async fn run(mut self) -> Result<(), LifecycleError> {
        info!(town = %self.config.town_root.display(), "deacon up");

        let heartbeat = tokio::spawn(heartbeat_task(
            self.registry.clone(),
            self.config.interval / 2,
        ));

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.monitor.cycle().await {
                        Ok(report) => {
                            if !report.warrants_filed.is_empty()
                                || !report.warrants_executed.is_empty()
                                || !report.nudged.is_empty()
                            {
                                info!(
                                    scanned = report.scanned,
                                    nudged = report.nudged.len(),
                                    filed = report.warrants_filed.len(),
                                    executed = report.warrants_executed.len(),
                                    redispatched = report.redispatched.len(),
                                    "cycle complete"
                                );
                            }
                        }
                        Err(e) => warn!(error = %e, "health cycle failed"),
                    }
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("SIGINT, shutting down");
                    break;
                }
            }
        }

        heartbeat.abort();
        Ok(())
    }
}

/// Boot's heartbeat: stamp the `hq-boot` bead so the watchdog can tell
/// a live deacon from a wedged one.
async fn heartbeat_task(registry: Registry<BdCli>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let now = chrono::Utc::now();
        let result = async {
            let bead = registry.show("hq-boot").await?;
            let mut fields = DescFields::parse(&bead.description);
            fields.set(FIELD_HEARTBEAT, now.to_rfc3339());
            registry
                .update(
                    "hq-boot",
                    &UpdatePatch {
                        status: None,
                        assignee: None,
                        description: Some(fields.to_string()),
                    },
                )
                .await
        }
        .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "heartbeat not written");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
