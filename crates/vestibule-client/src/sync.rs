// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic conversation sync.
//!
//! The client holds a local copy of the conversation state, field bag, and
//! transcript. Mutations apply optimistically on success and are immediately
//! reconciled by a fetch; the fetch response always overwrites the local
//! copy, never merges with it. A background poll repeats the fetch on a
//! fixed interval to absorb out-of-band changes, and stops the instant the
//! handle is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vestibule_core::fields::keys;
use vestibule_core::types::{merge_fields, ConversationState, FieldBag, Message, SenderType};
use vestibule_core::VestibuleError;

use crate::api::ApiClient;

/// The client-side copy of one conversation.
#[derive(Debug, Clone)]
pub struct LocalConversation {
    pub state: ConversationState,
    pub fields: FieldBag,
    pub transcript: Vec<Message>,
}

/// Handle to a synced conversation. Dropping it stops the background poll.
pub struct ConversationSync {
    api: ApiClient,
    conversation_id: String,
    local: Arc<Mutex<LocalConversation>>,
    poll_cancel: CancellationToken,
}

impl ConversationSync {
    /// Create a new conversation and start polling it.
    pub async fn initiate(
        api: ApiClient,
        poll_interval: Duration,
    ) -> Result<Self, VestibuleError> {
        let created = api.create_conversation(None).await?;
        Ok(Self::attach(api, created.id, created.state, created.normalized_fields, poll_interval))
    }

    /// Resume syncing an existing conversation id.
    pub async fn resume(
        api: ApiClient,
        conversation_id: &str,
        poll_interval: Duration,
    ) -> Result<Self, VestibuleError> {
        let snapshot = api.fetch_conversation(conversation_id).await?;
        let sync = Self::attach(
            api,
            snapshot.id,
            snapshot.state,
            snapshot.normalized_fields,
            poll_interval,
        );
        {
            let mut local = sync.local.lock().await;
            local.transcript = snapshot.messages;
        }
        Ok(sync)
    }

    fn attach(
        api: ApiClient,
        conversation_id: String,
        state: ConversationState,
        fields: FieldBag,
        poll_interval: Duration,
    ) -> Self {
        let local = Arc::new(Mutex::new(LocalConversation {
            state,
            fields,
            transcript: Vec::new(),
        }));
        let poll_cancel = CancellationToken::new();

        spawn_poll(
            api.clone(),
            conversation_id.clone(),
            Arc::clone(&local),
            poll_interval,
            poll_cancel.clone(),
        );

        Self {
            api,
            conversation_id,
            local,
            poll_cancel,
        }
    }

    pub fn id(&self) -> &str {
        &self.conversation_id
    }

    /// A clone of the current local copy.
    pub async fn local(&self) -> LocalConversation {
        self.local.lock().await.clone()
    }

    /// Submit a message with a field delta.
    ///
    /// On acceptance the delta merges into the local bag and the message
    /// appends to the local transcript, then a fetch reconciles both against
    /// the authoritative row. On rejection the local copy is untouched and
    /// the structured error is returned to the caller, who owns retry.
    pub async fn submit(
        &self,
        body: &str,
        fields: FieldBag,
    ) -> Result<ConversationState, VestibuleError> {
        let accepted = self
            .api
            .post_message(
                &self.conversation_id,
                SenderType::Contact,
                body,
                Some(&fields),
            )
            .await?;

        {
            let mut local = self.local.lock().await;
            local.state = accepted.state;
            merge_fields(&mut local.fields, &fields);
            local.transcript.push(Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: self.conversation_id.clone(),
                sender_type: SenderType::Contact,
                body: body.to_string(),
                fields: Some(fields),
                created_at: chrono::Utc::now()
                    .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                    .to_string(),
            });
        }

        // Reconcile immediately; the authoritative view replaces the
        // optimistic one. The mutation already landed, so a failed fetch
        // here is left to the next poll tick.
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "post-mutation reconcile fetch failed");
        }
        Ok(self.local.lock().await.state)
    }

    /// Submit the scheduling step using the configured external booking
    /// link instead of proposing times.
    pub async fn use_booking_link(&self, body: &str) -> Result<ConversationState, VestibuleError> {
        let url = self
            .api
            .booking_url()
            .ok_or_else(|| {
                VestibuleError::InvalidInput("no booking link configured".to_string())
            })?
            .to_string();
        let mut delta = FieldBag::new();
        delta.insert(keys::SCHEDULING_OPTION.to_string(), "link".to_string());
        delta.insert(keys::BOOKING_URL.to_string(), url);
        self.submit(body, delta).await
    }

    /// Submit the scheduling step by proposing times in a timezone.
    pub async fn propose_times(
        &self,
        body: &str,
        preferred_times: &str,
        timezone: &str,
    ) -> Result<ConversationState, VestibuleError> {
        let mut delta = FieldBag::new();
        delta.insert(keys::PREFERRED_TIMES.to_string(), preferred_times.to_string());
        delta.insert(keys::TIMEZONE.to_string(), timezone.to_string());
        self.submit(body, delta).await
    }

    /// Force the terminal transition, then reconcile.
    pub async fn end_and_send(
        &self,
        summary: Option<&str>,
    ) -> Result<ConversationState, VestibuleError> {
        let accepted = self
            .api
            .end_and_send(&self.conversation_id, summary)
            .await?;
        {
            let mut local = self.local.lock().await;
            local.state = accepted.state;
        }
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "post-mutation reconcile fetch failed");
        }
        Ok(self.local.lock().await.state)
    }

    /// Fetch the authoritative view and overwrite the local copy with it.
    pub async fn refresh(&self) -> Result<(), VestibuleError> {
        let snapshot = self.api.fetch_conversation(&self.conversation_id).await?;
        let mut local = self.local.lock().await;
        local.state = snapshot.state;
        local.fields = snapshot.normalized_fields;
        local.transcript = snapshot.messages;
        Ok(())
    }

    /// Stop the background poll. Also happens on drop.
    pub fn stop(&self) {
        self.poll_cancel.cancel();
    }
}

impl Drop for ConversationSync {
    fn drop(&mut self) {
        self.poll_cancel.cancel();
    }
}

/// Background fetch loop. Poll failures are logged at debug and retried on
/// the next tick; a failed read must never touch the local copy.
fn spawn_poll(
    api: ApiClient,
    conversation_id: String,
    local: Arc<Mutex<LocalConversation>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            match api.fetch_conversation(&conversation_id).await {
                Ok(snapshot) => {
                    let mut local = local.lock().await;
                    local.state = snapshot.state;
                    local.fields = snapshot.normalized_fields;
                    local.transcript = snapshot.messages;
                }
                Err(e) => {
                    debug!(conversation_id = %conversation_id, error = %e, "poll fetch failed");
                }
            }
        }
        debug!(conversation_id = %conversation_id, "poll stopped");
    });
}
