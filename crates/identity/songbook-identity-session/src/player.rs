//! Player token lifecycle.
//!
//! The embedded player authenticates its media requests with a narrow
//! read-only API token rather than the full session credential. It is minted
//! lazily on first use, cached in the native shell's persisted store, and
//! never auto-expired; only an explicit user-triggered reset discards and
//! revokes it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::store::KeyValueStore;
use crate::SessionResult;

/// Key of the cached player token in the native store.
pub const PLAYER_TOKEN_KEY: &str = "player_token";

/// Server-side token minting and revocation, implemented by the API client.
#[async_trait]
pub trait PlayerTokenIssuer: Send + Sync {
    /// Create a new long-lived read-only API token for the current user.
    async fn issue(&self) -> SessionResult<String>;

    /// Revoke every API token issued to the current user.
    async fn revoke_all(&self) -> SessionResult<()>;
}

pub struct PlayerTokenService {
    cache: Arc<dyn KeyValueStore>,
    issuer: Arc<dyn PlayerTokenIssuer>,
}

impl PlayerTokenService {
    pub fn new(cache: Arc<dyn KeyValueStore>, issuer: Arc<dyn PlayerTokenIssuer>) -> Self {
        Self { cache, issuer }
    }

    /// Return the cached player token, minting and caching one on first use.
    pub async fn get_or_issue(&self) -> SessionResult<String> {
        if let Some(token) = self.cache.get_value(PLAYER_TOKEN_KEY).await? {
            return Ok(token);
        }

        let token = self.issuer.issue().await?;
        self.cache.set_value(PLAYER_TOKEN_KEY, &token).await?;
        info!("issued and cached a new player token");
        Ok(token)
    }

    /// Discard the cached token and revoke the user's issued tokens
    /// server-side. The next player start mints a fresh one.
    pub async fn reset(&self) -> SessionResult<()> {
        self.cache.remove_value(PLAYER_TOKEN_KEY).await?;
        self.issuer.revoke_all().await?;
        info!("player token reset");
        Ok(())
    }
}
