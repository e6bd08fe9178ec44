// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Vestibule crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The accumulated mapping of normalized answer values, keyed by the fixed
/// vocabulary in [`crate::fields::keys`]. `BTreeMap` keeps serialization
/// deterministic.
pub type FieldBag = BTreeMap<String, String>;

/// The eight ordered steps of the guided intake conversation.
///
/// State only moves forward through this order (with one scheduling-skip
/// rule) or jumps to the terminal `Submit` via an explicit end action; it
/// never regresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Welcome,
    ModeSelect,
    Identity,
    BusinessContext,
    Needs,
    Scheduling,
    Summary,
    Submit,
}

impl ConversationState {
    /// `Submit` is the only terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversationState::Submit)
    }
}

/// Who authored a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Contact,
    System,
}

/// A single guided-intake session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub account_id: String,
    pub channel: String,
    pub subject: Option<String>,
    pub state: ConversationState,
    pub normalized_fields: FieldBag,
    pub created_at: String,
    pub updated_at: String,
}

/// An entry in a conversation's append-only transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_type: SenderType,
    pub body: String,
    /// The structured field delta that accompanied the message, if any.
    pub fields: Option<FieldBag>,
    pub created_at: String,
}

/// Descriptor for an uploaded file. The storage backend owns the bytes;
/// this is a back-reference carried on messages and requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub url: String,
    pub key: String,
}

/// A project visible to an authenticated account. Read-only here; owned by
/// an external system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Classification of a client-submitted request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Bug,
    Change,
    New,
}

/// A client-submitted ticket, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTicket {
    pub id: String,
    pub project_id: String,
    pub request_type: RequestType,
    pub description: String,
    pub impact: String,
    pub urgency: String,
    pub attachments: Vec<Attachment>,
    pub created_at: String,
}

/// Merge a submitted field delta into a bag, last write wins per key.
/// Keys are never removed.
pub fn merge_fields(bag: &mut FieldBag, delta: &FieldBag) {
    for (key, value) in delta {
        bag.insert(key.clone(), value.clone());
    }
}
