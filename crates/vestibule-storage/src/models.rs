// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage entity types.
//!
//! The canonical domain types live in `vestibule-core::types` and are
//! re-exported here. Auth entities are storage-only and never cross the
//! HTTP boundary in full.

use serde::{Deserialize, Serialize};

pub use vestibule_core::types::{Conversation, Message, Project, RequestTicket};

/// An account keyed by verified email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// A pending OTP challenge. `consumed` flips exactly once.
#[derive(Debug, Clone)]
pub struct AuthChallenge {
    pub id: String,
    pub email: String,
    pub code: String,
    pub consumed: bool,
    pub created_at: String,
}

/// An issued bearer token. Expiry is computed from `created_at` at lookup
/// time, so TTL changes apply to existing tokens.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub account_id: String,
    pub email: String,
    pub created_at: String,
}
