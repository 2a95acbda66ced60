// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent mail over the issue store.
//!
//! Delivery is at-least-once: sends fan out one message bead per
//! recipient, acks are idempotent field flips on the bead. Desktop
//! notifications ride on an async worker so a slow notifier never
//! blocks a send.

use crate::registry::Registry;
use crate::GtError;
use gt_adapters::{BeadsAdapter, CreateOpts, ListFilter, NotifyAdapter};
use gt_core::fields::FIELD_DELIVERED;
use gt_core::{Address, AgentId, BeadType, DescFields, Envelope, MailType, Priority, Role};
use gt_storage::Town;

/// Options for one send.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub priority: Priority,
    pub mail_type: MailType,
    pub cc: Vec<String>,
    pub reply_to: Option<String>,
    /// Ephemeral message, purged after its TTL.
    pub wisp: bool,
    pub pinned: bool,
    pub suppress_notify: bool,
}

/// Per-recipient outcome of a fan-out send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub recipient: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Output of `mail check --inject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectReport {
    pub text: String,
    /// Message IDs marked delivered by this check.
    pub delivered: Vec<String>,
}

/// The mail router.
#[derive(Clone)]
pub struct MailRouter<B, N> {
    registry: Registry<B>,
    notify: N,
    town: Town,
    actor: AgentId,
}

impl<B: BeadsAdapter, N: NotifyAdapter> MailRouter<B, N> {
    pub fn new(registry: Registry<B>, notify: N, town: Town, actor: AgentId) -> Self {
        Self {
            registry,
            notify,
            town,
            actor,
        }
    }

    /// Send to every address. Each delivery is attempted independently;
    /// the call only fails outright when zero recipients succeed.
    pub async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        opts: &SendOptions,
    ) -> Result<Vec<SendResult>, GtError> {
        let thread_id = self.thread_for(opts).await;
        let mut results = Vec::new();

        for addr_str in to {
            let Some(address) = Address::parse(addr_str) else {
                results.push(SendResult {
                    recipient: addr_str.clone(),
                    ok: false,
                    error: Some("unparseable address".to_string()),
                });
                continue;
            };
            match address {
                // Queue and channel sends are one bead, claimed or
                // broadcast on the read side.
                Address::Queue(name) => {
                    let recipient = format!("queue:{}", name);
                    results.push(
                        self.write_message(&recipient, subject, body, &thread_id, opts)
                            .await,
                    );
                }
                Address::Channel(name) => {
                    let recipient = format!("channel:{}", name);
                    results.push(
                        self.write_message(&recipient, subject, body, &thread_id, opts)
                            .await,
                    );
                }
                other => match self.resolve_recipients(&other).await {
                    Ok(recipients) => {
                        for recipient in recipients {
                            results.push(
                                self.write_message(&recipient, subject, body, &thread_id, opts)
                                    .await,
                            );
                        }
                    }
                    Err(e) => results.push(SendResult {
                        recipient: addr_str.clone(),
                        ok: false,
                        error: Some(e.to_string()),
                    }),
                },
            }
        }

        if !results.is_empty() && results.iter().all(|r| !r.ok) {
            return Err(GtError::PartialFailure(format!(
                "no recipients reachable ({} attempted)",
                results.len()
            )));
        }
        Ok(results)
    }

    /// Resolve a fan-out address to concrete agent IDs.
    pub async fn resolve_recipients(&self, address: &Address) -> Result<Vec<String>, GtError> {
        match address {
            Address::Agent(s) => {
                let agent = AgentId::parse(s)
                    .map_err(|e| GtError::Fatal(format!("bad recipient {}: {}", s, e)))?;
                Ok(vec![agent.to_string()])
            }
            Address::Mayor | Address::Human => Ok(vec!["mayor".to_string()]),
            Address::Myself => Ok(vec![self.actor.to_string()]),
            Address::Group(name) => self.group_members(name),
            Address::Town => {
                let agents = self.registry.list_agent_beads().await?;
                Ok(agents
                    .iter()
                    .filter_map(|b| self.registry.agent_for_bead_id(b.id.as_str()))
                    .map(|a| a.to_string())
                    .collect())
            }
            Address::Witnesses => {
                let mut out = Vec::new();
                for route in self.registry.routes().routes() {
                    if let Some(rig) = self.registry.routes().rig_of(&route.prefix) {
                        out.push(AgentId::witness(rig).to_string());
                    }
                }
                Ok(out)
            }
            Address::CrewWide => {
                if self.actor.rig.is_empty() {
                    return Err(GtError::Fatal(
                        "@crew needs a rig-scoped sender".to_string(),
                    ));
                }
                let prefix = self
                    .registry
                    .routes()
                    .short_prefix_for_rig(&self.actor.rig)
                    .ok_or_else(|| GtError::not_found("rig route", &self.actor.rig))?;
                let marker = format!("{}-{}-crew-", prefix, self.actor.rig);
                let agents = self.registry.list_agent_beads().await?;
                Ok(agents
                    .iter()
                    .filter(|b| b.id.as_str().starts_with(&marker))
                    .filter_map(|b| self.registry.agent_for_bead_id(b.id.as_str()))
                    .map(|a| a.to_string())
                    .collect())
            }
            Address::Overseer => {
                if self.actor.role == Role::Polecat {
                    Ok(vec![AgentId::witness(&self.actor.rig).to_string()])
                } else {
                    Ok(vec!["mayor".to_string()])
                }
            }
            Address::Queue(_) | Address::Channel(_) => Ok(Vec::new()),
        }
    }

    fn group_members(&self, name: &str) -> Result<Vec<String>, GtError> {
        let path = self.town.root().join("mayor").join("groups.json");
        if !path.is_file() {
            return Err(GtError::not_found("group", name));
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|e| GtError::Fatal(format!("groups file unreadable: {}", e)))?;
        let groups: std::collections::HashMap<String, Vec<String>> =
            serde_json::from_str(&data)
                .map_err(|e| GtError::Fatal(format!("groups file malformed: {}", e)))?;
        groups
            .get(name)
            .cloned()
            .ok_or_else(|| GtError::not_found("group", name))
    }

    async fn write_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        thread_id: &str,
        opts: &SendOptions,
    ) -> SendResult {
        let envelope = Envelope {
            id: String::new(),
            thread_id: thread_id.to_string(),
            from: self.actor.to_string(),
            to: recipient.to_string(),
            cc: opts.cc.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
            priority: opts.priority,
            mail_type: opts.mail_type,
            pinned: opts.pinned,
            wisp: opts.wisp,
            reply_to: opts.reply_to.clone(),
            suppress_notify: opts.suppress_notify,
        };
        let mut description = envelope.to_fields().to_string();
        if !body.is_empty() {
            description.push('\n');
            description.push_str(body);
        }
        let create = CreateOpts {
            bead_type: BeadType::Message,
            title: subject.to_string(),
            description,
            priority: Some(opts.priority as i64),
            assignee: None,
            labels: vec![format!("mail:{}", recipient)],
            // Messages are ephemeral by default; pinned mail survives
            ephemeral: !opts.pinned,
        };
        match self.registry.create("hq", &create).await {
            Ok(id) => {
                tracing::debug!(recipient, message = %id, "mail written");
                self.spawn_notification(recipient, subject, opts);
                SendResult {
                    recipient: recipient.to_string(),
                    ok: true,
                    error: None,
                }
            }
            Err(e) => SendResult {
                recipient: recipient.to_string(),
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }

    fn spawn_notification(&self, recipient: &str, subject: &str, opts: &SendOptions) {
        if opts.suppress_notify {
            return;
        }
        let notify = self.notify.clone();
        let title = format!("gt mail for {}", recipient);
        let message = format!("{}: {}", self.actor, subject);
        tokio::spawn(async move {
            if let Err(e) = notify.notify(&title, &message).await {
                tracing::debug!(error = %e, "mail notification dropped");
            }
        });
    }

    /// Thread for this send: the replied-to message's thread (looked up
    /// in the sender's own mailbox, since the sender received it), or a
    /// fresh 128-bit ID.
    async fn thread_for(&self, opts: &SendOptions) -> String {
        if let Some(ref reply_to) = opts.reply_to {
            if let Ok(bead) = self.registry.show(reply_to).await {
                let fields = DescFields::parse(&bead.description);
                if let Some(thread) = fields.get("thread_id") {
                    if !thread.is_empty() {
                        return thread.to_string();
                    }
                }
            }
            tracing::warn!(reply_to = %reply_to, "reply target not in mailbox; starting a fresh thread");
        }
        gt_core::id::thread_id()
    }

    /// Unread mail for an agent. Pure read; nothing is acked.
    pub async fn inbox(&self, agent: &AgentId) -> Result<Vec<Envelope>, GtError> {
        let filter = ListFilter {
            bead_type: Some(BeadType::Message),
            label: Some(format!("mail:{}", agent)),
            ..Default::default()
        };
        let mut messages: Vec<Envelope> = self
            .registry
            .list("hq", &filter)
            .await?
            .iter()
            .filter(|b| {
                DescFields::parse(&b.description).get(FIELD_DELIVERED) != Some("true")
            })
            .map(|b| Envelope::from_parts(b.id.as_str(), &b.title, &b.description))
            .collect();
        messages.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(messages)
    }

    /// Build the tiered system-reminder block and ack everything listed.
    ///
    /// Returns `None` when the inbox is empty. Acks are idempotent, so a
    /// crashed check that re-runs delivers at least once, never zero.
    pub async fn check_inject(&self, agent: &AgentId) -> Result<Option<InjectReport>, GtError> {
        let messages = self.inbox(agent).await?;
        if messages.is_empty() {
            return Ok(None);
        }
        let text = render_inject(&messages);
        let mut delivered = Vec::new();
        for message in &messages {
            self.ack(&message.id).await?;
            delivered.push(message.id.clone());
        }
        Ok(Some(InjectReport { text, delivered }))
    }

    /// Mark one message delivered. Re-acking is a no-op.
    pub async fn ack(&self, message_id: &str) -> Result<(), GtError> {
        self.registry
            .set_field(message_id, FIELD_DELIVERED, "true")
            .await
    }
}

/// Render the tiered injection block.
///
/// Ordering is stable: urgent precedes high precedes normal (low rides
/// with normal), message-ID order within each tier. When urgent mail is
/// present the block leads with it and frames high as "also"; otherwise
/// the highest present tier sets the framing.
pub fn render_inject(messages: &[Envelope]) -> String {
    let mut by_tier: Vec<(&'static str, Vec<&Envelope>)> = vec![
        ("URGENT", Vec::new()),
        ("High-priority", Vec::new()),
        ("Mail", Vec::new()),
    ];
    for message in messages {
        let idx = match message.priority {
            Priority::Urgent => 0,
            Priority::High => 1,
            _ => 2,
        };
        by_tier[idx].1.push(message);
    }
    for (_, tier_messages) in &mut by_tier {
        tier_messages.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let mut out = String::from("<system-reminder>\n");
    let urgent_present = !by_tier[0].1.is_empty();
    let mut first_written = false;
    for (idx, (label, tier_messages)) in by_tier.iter().enumerate() {
        if tier_messages.is_empty() {
            continue;
        }
        if first_written {
            // Priority inversion: later tiers read as additions
            if urgent_present && idx == 1 {
                out.push_str(&format!(
                    "Also {} high-priority message(s):\n",
                    tier_messages.len()
                ));
            } else {
                out.push_str(&format!(
                    "Also {} message(s):\n",
                    tier_messages.len()
                ));
            }
        } else {
            out.push_str(&format!("{} ({}):\n", label, tier_messages.len()));
            first_written = true;
        }
        for message in tier_messages {
            out.push_str(&format!(
                "- [{}] from {}: {}\n",
                message.id, message.from, message.subject
            ));
        }
    }
    out.push_str("Read with `gt mail inbox`; these are now marked delivered.\n");
    out.push_str("</system-reminder>");
    out
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
