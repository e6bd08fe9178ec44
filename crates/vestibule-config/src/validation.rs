// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and sane
//! interval values.

use crate::diagnostic::ConfigError;
use crate::model::VestibuleConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VestibuleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.uploads.max_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "uploads.max_bytes must be greater than zero".to_string(),
        });
    }

    let has_allowed_type = config
        .uploads
        .allowed_types
        .split(',')
        .any(|t| !t.trim().is_empty());
    if !has_allowed_type {
        errors.push(ConfigError::Validation {
            message: "uploads.allowed_types must list at least one content type".to_string(),
        });
    }

    for (key, value) in [
        ("uploads.upload_base_url", &config.uploads.upload_base_url),
        ("uploads.public_base_url", &config.uploads.public_base_url),
        ("client.api_base_url", &config.client.api_base_url),
    ] {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be an http(s) URL, got `{value}`"),
            });
        }
    }

    if let Some(url) = &config.handoff.webhook_url
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!("handoff.webhook_url must be an http(s) URL, got `{url}`"),
        });
    }

    if config.auth.token_ttl_secs < 60 {
        errors.push(ConfigError::Validation {
            message: format!(
                "auth.token_ttl_secs must be at least 60, got {}",
                config.auth.token_ttl_secs
            ),
        });
    }

    if config.client.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.poll_interval_secs must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = VestibuleConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = VestibuleConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_upload_cap_fails_validation() {
        let mut config = VestibuleConfig::default();
        config.uploads.max_bytes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_bytes"))));
    }

    #[test]
    fn non_http_webhook_fails_validation() {
        let mut config = VestibuleConfig::default();
        config.handoff.webhook_url = Some("hooks.example.com/intake".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("webhook_url"))));
    }

    #[test]
    fn short_token_ttl_fails_validation() {
        let mut config = VestibuleConfig::default();
        config.auth.token_ttl_secs = 5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("token_ttl_secs"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = VestibuleConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.storage.database_path = "/tmp/test.db".to_string();
        config.handoff.webhook_url = Some("https://hooks.example.com/intake".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = VestibuleConfig::default();
        config.server.host = "".to_string();
        config.storage.database_path = "".to_string();
        config.uploads.max_bytes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
