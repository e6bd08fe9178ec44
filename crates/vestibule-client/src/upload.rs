// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase upload: presign against the API, then a direct byte transfer
//! to the storage backend.
//!
//! The local policy check mirrors the server's allow-list and size cap. It
//! is an optimization, not a trust boundary; the server re-validates on
//! presign. The direct transfer talks to storage, not to the API, so its
//! failures are transport errors and never presign rejections.

use std::time::Duration;

use tracing::debug;
use vestibule_core::types::Attachment;
use vestibule_core::upload::UploadPolicy;
use vestibule_core::VestibuleError;

use crate::api::ApiClient;

/// Bound on the direct byte transfer. Larger than the API timeout because
/// it carries file content.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Performs the two-phase upload workflow.
pub struct Uploader {
    api: ApiClient,
    policy: UploadPolicy,
    transfer: reqwest::Client,
}

impl Uploader {
    /// `policy` must mirror the server's configured limits.
    pub fn new(api: ApiClient, policy: UploadPolicy) -> Result<Self, VestibuleError> {
        let transfer = reqwest::Client::builder()
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(|e| VestibuleError::Transport {
                message: format!("failed to build transfer client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            api,
            policy,
            transfer,
        })
    }

    /// Upload one file and return its attachment descriptor.
    ///
    /// The descriptor is not linked to anything yet; attach it through a
    /// message mutation or a request creation.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        conversation_id: Option<&str>,
    ) -> Result<Attachment, VestibuleError> {
        let size = bytes.len() as u64;

        // Local check first, to fail before any network round trip.
        self.policy.validate(content_type, size)?;

        let grant = self
            .api
            .presign_upload(file_name, content_type, size, conversation_id)
            .await?;
        debug!(key = %grant.key, size, "presign granted");

        let response = self
            .transfer
            .put(&grant.upload_url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| VestibuleError::Transport {
                message: format!("upload transfer failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            return Err(VestibuleError::Transport {
                message: format!("upload transfer returned {}", response.status()),
                source: None,
            });
        }

        Ok(Attachment {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size,
            url: grant.file_url,
            key: grant.key,
        })
    }
}
