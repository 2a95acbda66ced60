// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared command context: town discovery, identity, adapter wiring.

use anyhow::{Context as _, Result};
use gt_adapters::{BdCli, DesktopNotifyAdapter, TmuxAdapter};
use gt_core::{AgentId, SystemClock};
use gt_engine::{
    ContextPrime, EnvIdentity, MailRouter, QuotaRotator, Refinery, Registry, RuntimeConfig,
    Sling, Supervisor,
};
use gt_storage::{AccountsFile, RouteTable, Town};
use std::path::{Path, PathBuf};

/// Everything a command handler needs, resolved once.
pub struct Ctx {
    pub town: Town,
    pub routes: RouteTable,
    pub actor: AgentId,
    pub identity_mismatch: bool,
    pub cwd: PathBuf,
}

impl Ctx {
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let cwd = match dir {
            Some(d) => d.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let town = Town::discover(&cwd).context("no town here")?;
        let routes = RouteTable::discover(&cwd)?;
        let identity =
            gt_engine::resolve_identity(&EnvIdentity::from_process(), &town, &cwd);
        let (actor, identity_mismatch) = match identity {
            Some(id) => (id.agent, id.mismatch),
            // Ad-hoc invocations outside any agent home act as the mayor
            None => (AgentId::mayor(), false),
        };
        Ok(Self {
            town,
            routes,
            actor,
            identity_mismatch,
            cwd,
        })
    }

    pub fn registry(&self) -> Registry<BdCli> {
        Registry::new(self.routes.clone(), BdCli::new(self.actor.to_string()))
    }

    pub fn supervisor(&self) -> Supervisor<TmuxAdapter> {
        Supervisor::new(TmuxAdapter::new())
    }

    pub fn sling(&self) -> Sling<BdCli, TmuxAdapter> {
        Sling::new(
            self.registry(),
            self.supervisor(),
            self.town.clone(),
            self.actor.clone(),
            RuntimeConfig::default(),
            self.cwd.clone(),
        )
    }

    pub fn router(&self) -> MailRouter<BdCli, DesktopNotifyAdapter> {
        MailRouter::new(
            self.registry(),
            DesktopNotifyAdapter::new(),
            self.town.clone(),
            self.actor.clone(),
        )
    }

    pub fn prime(&self) -> ContextPrime<BdCli, DesktopNotifyAdapter, SystemClock> {
        ContextPrime::new(self.registry(), self.router(), self.town.clone(), SystemClock)
    }

    pub fn rotator(&self) -> Result<QuotaRotator<TmuxAdapter, SystemClock>> {
        let accounts = AccountsFile::at(self.town.accounts_path()).load()?;
        Ok(QuotaRotator::new(
            self.supervisor(),
            self.town.clone(),
            self.routes.clone(),
            accounts,
            SystemClock,
        ))
    }

    pub fn refinery(&self, rig: &str, prefix: &str) -> Refinery<BdCli, SystemClock> {
        Refinery::new(
            self.registry(),
            self.town.clone(),
            SystemClock,
            rig,
            prefix,
        )
    }

    /// The rig a command operates on: explicit flag, else the actor's
    /// rig. Returns `(rig, short_prefix)`.
    pub fn rig_and_prefix(&self, explicit: Option<&str>) -> Result<(String, String)> {
        let rig = match explicit {
            Some(rig) => rig.to_string(),
            None if !self.actor.rig.is_empty() => self.actor.rig.clone(),
            None => anyhow::bail!("no rig in scope; pass --rig <name>"),
        };
        let prefix = self
            .routes
            .short_prefix_for_rig(&rig)
            .with_context(|| format!("rig {} has no route; check .beads/routes.jsonl", rig))?;
        Ok((rig, prefix))
    }

    /// Session name for an agent of this town.
    pub fn session_for(&self, agent: &AgentId) -> Result<String> {
        let prefix = if agent.rig.is_empty() {
            String::new()
        } else {
            self.routes
                .short_prefix_for_rig(&agent.rig)
                .with_context(|| format!("rig {} has no route", agent.rig))?
        };
        Ok(agent.session_name(&prefix))
    }
}
