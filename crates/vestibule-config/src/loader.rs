// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vestibule.toml` > `~/.config/vestibule/vestibule.toml`
//! > `/etc/vestibule/vestibule.toml` with environment variable overrides via
//! `VESTIBULE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VestibuleConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vestibule/vestibule.toml` (system-wide)
/// 3. `~/.config/vestibule/vestibule.toml` (user XDG config)
/// 4. `./vestibule.toml` (local directory)
/// 5. `VESTIBULE_*` environment variables
pub fn load_config() -> Result<VestibuleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VestibuleConfig::default()))
        .merge(Toml::file("/etc/vestibule/vestibule.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vestibule/vestibule.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vestibule.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VestibuleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VestibuleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VestibuleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VestibuleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `VESTIBULE_AUTH_TOKEN_TTL_SECS`
/// must map to `auth.token_ttl_secs`, not `auth.token.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("VESTIBULE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: VESTIBULE_UPLOADS_MAX_BYTES -> "uploads_max_bytes"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("uploads_", "uploads.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("handoff_", "handoff.", 1)
            .replacen("client_", "client.", 1);
        mapped.into()
    })
}
