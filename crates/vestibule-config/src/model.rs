// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vestibule intake engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use vestibule_core::upload::{DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_UPLOAD_BYTES};

/// Top-level Vestibule configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VestibuleConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Upload policy settings.
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// OTP challenge and bearer token settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Submission handoff settings.
    #[serde(default)]
    pub handoff: HandoffConfig,

    /// Embedded client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expected value of the `X-Captcha-Token` header on unauthenticated
    /// conversation creation. `None` disables the check.
    #[serde(default)]
    pub captcha_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            captcha_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vestibule").join("vestibule.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("vestibule.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Upload policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsConfig {
    /// Per-file size cap in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Comma-separated content-type allow list.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: String,

    /// Base URL where presigned PUT targets are rooted.
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,

    /// Base URL where uploaded files are publicly readable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_types: default_allowed_types(),
            upload_base_url: default_upload_base_url(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_types() -> String {
    DEFAULT_ALLOWED_TYPES.to_string()
}

fn default_upload_base_url() -> String {
    "http://127.0.0.1:8787/storage".to_string()
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8787/files".to_string()
}

/// OTP challenge and bearer token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Echo the OTP code back in the challenge response. Development only;
    /// production deployments deliver the code out of band.
    #[serde(default)]
    pub debug_echo_code: bool,

    /// Bearer token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            debug_echo_code: false,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    86_400
}

/// Submission handoff configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffConfig {
    /// Webhook URL notified once per submitted conversation.
    /// `None` disables handoff notifications.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Embedded client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the Vestibule API, up to and including `/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Background poll interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// External booking link offered during scheduling.
    #[serde(default)]
    pub booking_url: Option<String>,

    /// Captcha token sent when creating conversations.
    #[serde(default)]
    pub captcha_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            booking_url: None,
            captcha_token: None,
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8787/api".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}
