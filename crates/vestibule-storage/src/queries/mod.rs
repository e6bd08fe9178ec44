// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod auth;
pub mod conversations;
pub mod messages;
pub mod projects;
pub mod requests;
