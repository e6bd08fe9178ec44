// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server for the Vestibule intake engine.
//!
//! Exposes the conversation protocol (create, fetch, mutate, end-and-send),
//! the OTP auth flow, upload presigning, and the authenticated project and
//! request endpoints. Mutations on one conversation serialize through a
//! per-id lock so validate-then-advance is atomic.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod handoff;
pub mod server;
pub mod state;

pub use server::{build_router, start_server};
pub use state::AppState;
