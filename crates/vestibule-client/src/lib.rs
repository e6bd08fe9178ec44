// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol client for the Vestibule intake API.
//!
//! Four pieces: the typed HTTP client ([`api::ApiClient`]), the optimistic
//! conversation sync engine with background polling ([`sync::ConversationSync`]),
//! the two-phase upload workflow ([`upload::Uploader`]), and the five-step
//! authenticated request wizard ([`wizard`]).

pub mod api;
pub mod sync;
pub mod upload;
pub mod wizard;

pub use api::ApiClient;
pub use sync::ConversationSync;
pub use upload::Uploader;
