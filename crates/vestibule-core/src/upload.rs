// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload admission policy, shared by the presign endpoint and the client's
//! pre-flight check.

use crate::error::VestibuleError;

/// Default per-file size cap in bytes (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10_485_760;

/// Default content-type allow list.
pub const DEFAULT_ALLOWED_TYPES: &str = "image/png,image/jpeg,application/pdf";

/// Admission rules a file must pass before a presigned slot is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_ALLOWED_TYPES)
    }
}

impl UploadPolicy {
    /// Build a policy from a size cap and a comma-separated allow list.
    /// Entries are trimmed and lowercased; empty entries are dropped.
    pub fn new(max_bytes: u64, allowed_types: &str) -> Self {
        let allowed_types = allowed_types
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            max_bytes,
            allowed_types,
        }
    }

    /// Check a declared content type and length against the policy.
    ///
    /// Content types compare case-insensitively and ignore any `;` parameter
    /// suffix. Returns [`VestibuleError::UploadRejected`] naming the failed
    /// rule.
    pub fn validate(&self, content_type: &str, content_length: u64) -> Result<(), VestibuleError> {
        let declared = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.allowed_types.iter().any(|t| t == &declared) {
            return Err(VestibuleError::UploadRejected(format!(
                "content type {content_type:?} is not allowed"
            )));
        }
        if content_length > self.max_bytes {
            return Err(VestibuleError::UploadRejected(format!(
                "file of {content_length} bytes exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(())
    }
}

/// Reduce an arbitrary client-supplied file name to a safe storage-key
/// component: path separators and control characters become `_`, and the
/// result is never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_values() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.max_bytes, 10_485_760);
        assert_eq!(
            policy.allowed_types,
            vec!["image/png", "image/jpeg", "application/pdf"]
        );
    }

    #[test]
    fn accepts_allowed_type_under_cap() {
        let policy = UploadPolicy::default();
        policy.validate("image/png", 1024).unwrap();
        policy.validate("IMAGE/PNG", 1024).unwrap();
        policy.validate("application/pdf; charset=binary", 1024).unwrap();
    }

    #[test]
    fn rejects_disallowed_type() {
        let policy = UploadPolicy::default();
        let err = policy.validate("application/zip", 1024).unwrap_err();
        assert!(matches!(err, VestibuleError::UploadRejected(_)));
    }

    #[test]
    fn rejects_oversized_file() {
        let policy = UploadPolicy::new(100, "image/png");
        policy.validate("image/png", 100).unwrap();
        let err = policy.validate("image/png", 101).unwrap_err();
        assert!(matches!(err, VestibuleError::UploadRejected(_)));
    }

    #[test]
    fn custom_allow_list_is_trimmed_and_lowercased() {
        let policy = UploadPolicy::new(1024, " Image/PNG , text/plain ,");
        assert_eq!(policy.allowed_types, vec!["image/png", "text/plain"]);
    }

    #[test]
    fn file_names_are_reduced_to_safe_components() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("a:b*c?.png"), "a_b_c_.png");
        assert_eq!(sanitize_file_name("   "), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }
}
