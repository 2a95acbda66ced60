// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail envelopes and recipient addressing.
//!
//! Each message is a bead of type `message`; the envelope is encoded in
//! the bead's structured description fields and round-trips through
//! [`crate::fields::DescFields`].

use crate::fields::DescFields;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery priority. `Urgent` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "urgent" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailType {
    #[default]
    Notification,
    Reply,
    Request,
}

impl MailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailType::Notification => "notification",
            MailType::Reply => "reply",
            MailType::Request => "request",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "notification" => Some(MailType::Notification),
            "reply" => Some(MailType::Reply),
            "request" => Some(MailType::Request),
            _ => None,
        }
    }
}

/// A parsed recipient address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Direct agent ID (canonical or shorthand; dispatch resolves it).
    Agent(String),
    /// Named group; fan-out to each member.
    Group(String),
    /// Named queue; one bead, claimed by one worker.
    Queue(String),
    /// Named channel; one bead, broadcast.
    Channel(String),
    /// The town's mayor.
    Mayor,
    /// The human operator (mayor's inbox, urgent by convention).
    Human,
    /// The sending agent itself.
    Myself,
    /// Every agent in the town.
    Town,
    /// Every crew member of the sender's rig.
    CrewWide,
    /// Every rig's witness.
    Witnesses,
    /// The sender's overseer (witness for polecats, mayor otherwise).
    Overseer,
}

impl Address {
    /// Parse a recipient string as given on the command line.
    pub fn parse(s: &str) -> Option<Address> {
        if s.is_empty() {
            return None;
        }
        if let Some(name) = s.strip_prefix("group:") {
            return (!name.is_empty()).then(|| Address::Group(name.to_string()));
        }
        if let Some(name) = s.strip_prefix("queue:") {
            return (!name.is_empty()).then(|| Address::Queue(name.to_string()));
        }
        if let Some(name) = s.strip_prefix("channel:") {
            return (!name.is_empty()).then(|| Address::Channel(name.to_string()));
        }
        match s {
            "@town" => Some(Address::Town),
            "@crew" => Some(Address::CrewWide),
            "@witnesses" => Some(Address::Witnesses),
            "@overseer" => Some(Address::Overseer),
            "mayor" | "mayor/" => Some(Address::Mayor),
            "--human" => Some(Address::Human),
            "--self" => Some(Address::Myself),
            other if other.starts_with('@') || other.starts_with('-') => None,
            other => Some(Address::Agent(other.to_string())),
        }
    }
}

/// A mail envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, rename = "type")]
    pub mail_type: MailType,
    #[serde(default)]
    pub pinned: bool,
    /// Ephemeral message; purged after delivery TTL.
    #[serde(default)]
    pub wisp: bool,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub suppress_notify: bool,
}

impl Envelope {
    /// Encode the envelope into description fields. The subject is the
    /// bead title and the body is the prose; neither is a field here.
    pub fn to_fields(&self) -> DescFields {
        let mut fields = DescFields::default();
        fields.set("thread_id", &self.thread_id);
        fields.set("from", &self.from);
        fields.set("to", &self.to);
        if !self.cc.is_empty() {
            fields.set("cc", self.cc.join(","));
        }
        fields.set("priority", self.priority.as_str());
        fields.set("type", self.mail_type.as_str());
        if self.pinned {
            fields.set("pinned", "true");
        }
        if self.wisp {
            fields.set("wisp", "true");
        }
        if let Some(ref reply_to) = self.reply_to {
            fields.set("reply_to", reply_to);
        }
        if self.suppress_notify {
            fields.set("suppress_notify", "true");
        }
        fields
    }

    /// Decode an envelope from a message bead's parts. Missing fields
    /// take their defaults so old beads stay readable.
    pub fn from_parts(id: &str, title: &str, description: &str) -> Self {
        let fields = DescFields::parse(description);
        let body = fields.prose();
        Self {
            id: id.to_string(),
            thread_id: fields.get("thread_id").unwrap_or_default().to_string(),
            from: fields.get("from").unwrap_or_default().to_string(),
            to: fields.get("to").unwrap_or_default().to_string(),
            cc: fields
                .get("cc")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            subject: title.to_string(),
            body,
            priority: fields
                .get("priority")
                .and_then(Priority::parse)
                .unwrap_or_default(),
            mail_type: fields
                .get("type")
                .and_then(MailType::parse)
                .unwrap_or_default(),
            pinned: fields.get("pinned") == Some("true"),
            wisp: fields.get("wisp") == Some("true"),
            reply_to: fields.get("reply_to").map(str::to_string),
            suppress_notify: fields.get("suppress_notify") == Some("true"),
        }
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
