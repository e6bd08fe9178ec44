// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core domain layer for the Vestibule guided-intake engine.
//!
//! Holds the types shared across the server, storage, and client crates:
//! the conversation state machine, field normalization and summary
//! rendering, the shared upload policy, and the workspace error type.
//! This crate performs no I/O.

pub mod error;
pub mod fields;
pub mod machine;
pub mod types;
pub mod upload;

pub use error::VestibuleError;
pub use types::{
    Attachment, Conversation, ConversationState, FieldBag, Message, Project, RequestTicket,
    RequestType, SenderType,
};
