//! Pending login attempt storage.
//!
//! A login attempt spans a full page navigation: the verifier and `state` are
//! written before the user leaves for the provider and consumed exactly once
//! when the callback fires. Exactly one attempt is pending at a time; starting
//! a second attempt abandons the first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::OidcResult;

/// State held for one in-flight login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// Anti-CSRF binding sent as the `state` query parameter and checked on
    /// the callback.
    pub state: String,
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn new(state: String, code_verifier: String) -> Self {
        Self {
            state,
            code_verifier,
            created_at: Utc::now(),
        }
    }
}

/// Single-slot store for the pending login attempt.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    /// Record a new pending attempt, overwriting any existing one.
    async fn save(&self, attempt: LoginAttempt) -> OidcResult<()>;

    /// Consume the pending attempt, leaving the slot empty.
    async fn take(&self) -> OidcResult<Option<LoginAttempt>>;
}

/// In-memory implementation of [`LoginAttemptStore`].
pub struct InMemoryAttemptStore {
    slot: RwLock<Option<LoginAttempt>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl Default for InMemoryAttemptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginAttemptStore for InMemoryAttemptStore {
    async fn save(&self, attempt: LoginAttempt) -> OidcResult<()> {
        let mut slot = self.slot.write().await;
        if slot.is_some() {
            tracing::debug!("abandoning previous login attempt");
        }
        *slot = Some(attempt);
        Ok(())
    }

    async fn take(&self) -> OidcResult<Option<LoginAttempt>> {
        let mut slot = self.slot.write().await;
        Ok(slot.take())
    }
}
