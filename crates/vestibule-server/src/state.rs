// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared state for axum request handlers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vestibule_config::VestibuleConfig;
use vestibule_core::upload::UploadPolicy;
use vestibule_storage::Database;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Single-writer database handle.
    pub db: Arc<Database>,
    /// Loaded configuration.
    pub config: Arc<VestibuleConfig>,
    /// Per-conversation mutation locks. Mutations on one conversation
    /// serialize so validate-then-advance is atomic; reads bypass this.
    pub conversation_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    /// Outbound HTTP client for the handoff webhook.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, config: VestibuleConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            conversation_locks: Arc::new(DashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    /// Acquire the mutation lock for one conversation id. The returned
    /// guard evicts the lock table entry on drop when no other task is
    /// waiting on it, so the table tracks in-flight mutations rather than
    /// every conversation ever touched.
    pub async fn lock_for(&self, conversation_id: &str) -> MutationGuard {
        let lock = self
            .conversation_locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        MutationGuard {
            locks: Arc::clone(&self.conversation_locks),
            id: conversation_id.to_string(),
            _guard: lock.lock_owned().await,
        }
    }

    /// The upload admission policy derived from config.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.config.uploads.max_bytes, &self.config.uploads.allowed_types)
    }
}

/// Exclusive hold on one conversation's mutation lock.
pub struct MutationGuard {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    id: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        // The map entry plus this guard's own handle account for two strong
        // references; anything above that is a waiter that still needs the
        // entry. The predicate runs under the shard lock, so no new waiter
        // can clone the entry mid-eviction.
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) <= 2);
    }
}
