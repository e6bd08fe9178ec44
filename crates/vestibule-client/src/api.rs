// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed HTTP client for the Vestibule intake API.
//!
//! Every call is request/response with a bounded timeout. Non-2xx responses
//! carrying the structured `{"detail": ...}` body are decoded into the
//! matching [`VestibuleError`] variant; anything else surfaces as a
//! retryable transport error.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use vestibule_config::ClientConfig;
use vestibule_core::types::{
    Attachment, ConversationState, FieldBag, Message, Project, RequestType, SenderType,
};
use vestibule_core::VestibuleError;

/// Bound on every API round trip. A timeout is a transport error, never a
/// state transition.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the anti-automation token on sensitive calls.
const CAPTCHA_HEADER: &str = "x-captcha-token";

/// Client for the Vestibule HTTP API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    captcha_token: Option<String>,
    bearer_token: Option<String>,
    booking_url: Option<String>,
}

/// Response to conversation creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationCreated {
    pub id: String,
    pub state: ConversationState,
    pub normalized_fields: FieldBag,
}

/// The authoritative conversation view returned by fetch. Local optimistic
/// copies are always overwritten with this.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSnapshot {
    pub id: String,
    pub state: ConversationState,
    pub normalized_fields: FieldBag,
    pub messages: Vec<Message>,
}

/// Acknowledgement of an accepted mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationAccepted {
    pub ok: bool,
    pub state: ConversationState,
}

/// Response to an OTP request. `dev_code` is only present when the server
/// runs with the debug echo enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpChallenge {
    pub challenge_id: String,
    #[serde(default)]
    pub dev_code: Option<String>,
}

/// Response to a successful OTP verification.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpVerified {
    pub token: String,
    pub account_id: String,
}

/// Presign grant: where to PUT the bytes, where they will be readable, and
/// the storage key.
#[derive(Debug, Clone, Deserialize)]
pub struct PresignGrant {
    pub upload_url: String,
    pub file_url: String,
    pub key: String,
}

/// Body for request-ticket creation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewRequest {
    pub project_id: String,
    pub request_type: RequestType,
    pub description: String,
    pub impact: String,
    pub urgency: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    error: String,
    #[serde(default)]
    state: Option<ConversationState>,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

impl ApiClient {
    /// Build a client from the `[client]` config section.
    pub fn new(config: &ClientConfig) -> Result<Self, VestibuleError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VestibuleError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            captcha_token: config.captcha_token.clone(),
            bearer_token: None,
            booking_url: config.booking_url.clone(),
        })
    }

    /// The configured external booking link, if any.
    pub fn booking_url(&self) -> Option<&str> {
        self.booking_url.as_deref()
    }

    /// Attach a bearer token obtained from [`ApiClient::verify_otp`]. All
    /// subsequent project and request calls use it.
    pub fn with_bearer_token(mut self, token: String) -> Self {
        self.bearer_token = Some(token);
        self
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// POST /conversations. Carries the captcha header when configured.
    pub async fn create_conversation(
        &self,
        subject: Option<&str>,
    ) -> Result<ConversationCreated, VestibuleError> {
        let body = serde_json::json!({ "channel": "web", "subject": subject });
        let request = self
            .client
            .post(format!("{}/conversations", self.base_url))
            .json(&body);
        self.send(self.with_captcha(request)).await
    }

    /// GET /conversations/{id}: the authoritative state, bag, and transcript.
    pub async fn fetch_conversation(
        &self,
        id: &str,
    ) -> Result<ConversationSnapshot, VestibuleError> {
        let request = self
            .client
            .get(format!("{}/conversations/{id}", self.base_url));
        self.send(request).await
    }

    /// POST /conversations/{id}/message: submit a body plus a field delta.
    pub async fn post_message(
        &self,
        id: &str,
        sender_type: SenderType,
        body: &str,
        fields: Option<&FieldBag>,
    ) -> Result<MutationAccepted, VestibuleError> {
        let payload = serde_json::json!({
            "sender_type": sender_type,
            "body": body,
            "fields": fields,
        });
        let request = self
            .client
            .post(format!("{}/conversations/{id}/message", self.base_url))
            .json(&payload);
        self.send(request).await
    }

    /// POST /conversations/{id}/end-and-send: force the terminal transition.
    pub async fn end_and_send(
        &self,
        id: &str,
        summary: Option<&str>,
    ) -> Result<MutationAccepted, VestibuleError> {
        let payload = serde_json::json!({ "summary": summary });
        let request = self
            .client
            .post(format!("{}/conversations/{id}/end-and-send", self.base_url))
            .json(&payload);
        self.send(request).await
    }

    /// POST /auth/request-otp. Carries the captcha header when configured.
    pub async fn request_otp(&self, email: &str) -> Result<OtpChallenge, VestibuleError> {
        let payload = serde_json::json!({ "email": email });
        let request = self
            .client
            .post(format!("{}/auth/request-otp", self.base_url))
            .json(&payload);
        self.send(self.with_captcha(request)).await
    }

    /// POST /auth/verify-otp: consume a challenge, returning the bearer
    /// credential on success.
    pub async fn verify_otp(
        &self,
        challenge_id: &str,
        code: &str,
    ) -> Result<OtpVerified, VestibuleError> {
        let payload = serde_json::json!({ "challenge_id": challenge_id, "code": code });
        let request = self
            .client
            .post(format!("{}/auth/verify-otp", self.base_url))
            .json(&payload);
        self.send(request).await
    }

    /// GET /projects (bearer).
    pub async fn list_projects(&self) -> Result<Vec<Project>, VestibuleError> {
        let request = self.client.get(format!("{}/projects", self.base_url));
        let list: ProjectList = self.send(self.with_bearer(request)?).await?;
        Ok(list.projects)
    }

    /// POST /requests (bearer): create one immutable ticket, returning its id.
    pub async fn create_request(&self, request: &NewRequest) -> Result<String, VestibuleError> {
        let req = self
            .client
            .post(format!("{}/requests", self.base_url))
            .json(request);
        let created: CreatedId = self.send(self.with_bearer(req)?).await?;
        Ok(created.id)
    }

    /// POST /uploads/presign: declare a file and receive a one-time grant.
    pub async fn presign_upload(
        &self,
        file_name: &str,
        content_type: &str,
        content_length: u64,
        conversation_id: Option<&str>,
    ) -> Result<PresignGrant, VestibuleError> {
        let payload = serde_json::json!({
            "file_name": file_name,
            "content_type": content_type,
            "content_length": content_length,
            "conversation_id": conversation_id,
        });
        let request = self
            .client
            .post(format!("{}/uploads/presign", self.base_url))
            .json(&payload);
        self.send(request).await
    }

    fn with_captcha(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.captcha_token {
            Some(token) => request.header(CAPTCHA_HEADER, token),
            None => request,
        }
    }

    fn with_bearer(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, VestibuleError> {
        let token = self
            .bearer_token
            .as_ref()
            .ok_or_else(|| VestibuleError::Auth("no bearer token held".to_string()))?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, VestibuleError> {
        let response = request.send().await.map_err(|e| VestibuleError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, "API response received");

        if status.is_success() {
            let body = response.text().await.map_err(|e| VestibuleError::Transport {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            return serde_json::from_str(&body).map_err(|e| VestibuleError::Transport {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(decode_error(status, &body))
    }
}

/// Map a non-2xx response to the error taxonomy. Structured validation
/// bodies become typed errors; everything else is a retryable transport
/// failure.
fn decode_error(status: reqwest::StatusCode, body: &str) -> VestibuleError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let detail = envelope.detail;
        match detail.error.as_str() {
            "missing_fields" => {
                if let Some(state) = detail.state {
                    return VestibuleError::MissingFields {
                        state,
                        fields: detail.fields,
                    };
                }
                return VestibuleError::InvalidInput(format!(
                    "missing fields: {}",
                    detail.fields.join(", ")
                ));
            }
            "upload_rejected" => {
                return VestibuleError::UploadRejected(
                    detail.message.unwrap_or_else(|| "upload rejected".to_string()),
                );
            }
            "auth" => {
                return VestibuleError::Auth(
                    detail.message.unwrap_or_else(|| "unauthorized".to_string()),
                );
            }
            "not_found" => {
                return VestibuleError::NotFound(
                    detail.message.unwrap_or_else(|| "resource".to_string()),
                );
            }
            other => {
                if status.as_u16() == 422 {
                    return VestibuleError::InvalidInput(other.to_string());
                }
            }
        }
    }

    match status.as_u16() {
        401 => VestibuleError::Auth(format!("API returned 401: {body}")),
        404 => VestibuleError::NotFound(format!("API returned 404: {body}")),
        _ => VestibuleError::Transport {
            message: format!("API returned {status}: {body}"),
            source: None,
        },
    }
}
