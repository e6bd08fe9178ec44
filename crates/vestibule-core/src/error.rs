// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vestibule workspace.

use thiserror::Error;

use crate::types::ConversationState;

/// The primary error type used across the Vestibule crates.
///
/// The taxonomy mirrors how errors are surfaced to callers: validation
/// errors are caller-correctable and never advance conversation state,
/// auth errors require re-authentication, transport errors are retryable,
/// and not-found errors require re-initiating the operation.
#[derive(Debug, Error)]
pub enum VestibuleError {
    /// Configuration errors (invalid TOML, bad values, missing sections).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A mutation did not satisfy the current step's required field set.
    ///
    /// `fields` lists every missing or invalid field name so the caller can
    /// highlight them; the conversation state is unchanged.
    #[error("missing or invalid fields for {state}: {fields:?}")]
    MissingFields {
        state: ConversationState,
        fields: Vec<String>,
    },

    /// A caller-correctable input problem outside the state machine
    /// (malformed email on an OTP request, empty wizard description).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failures (bad or reused OTP, missing/expired bearer token).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Upload presign rejection (content type not allow-listed, size over cap).
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// Unknown conversation, project, or challenge id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or non-2xx server failure without a structured validation body.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VestibuleError {
    /// True for failures that are safe to retry with the identical call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VestibuleError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_names_state_and_fields() {
        let err = VestibuleError::MissingFields {
            state: ConversationState::Identity,
            fields: vec!["email".to_string()],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("IDENTITY"), "got: {rendered}");
        assert!(rendered.contains("email"), "got: {rendered}");
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        let transport = VestibuleError::Transport {
            message: "connection reset".to_string(),
            source: None,
        };
        assert!(transport.is_retryable());
        assert!(!VestibuleError::Auth("expired".to_string()).is_retryable());
        assert!(!VestibuleError::NotFound("conversation".to_string()).is_retryable());
    }
}
