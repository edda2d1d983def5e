//! Native-side deep-link listener and handoff state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{BridgeError, BridgeResult};
use crate::handoff::{desktop_entry_url, extract_handoff_token};
use crate::platform::Platform;
use songbook_identity_session::SessionStore;

/// Observable progress of the native login handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffState {
    /// No session; nothing in flight. The shell stays here indefinitely if
    /// the browser context is closed before the handoff fires.
    NotStarted,
    /// The login browser context has been opened; waiting on the deep link.
    HandoffRequested,
    /// A handoff URI arrived and its token was extracted.
    Received,
    /// The credential is in the native store; the UI may reload.
    Complete,
}

/// Carries a session credential from the browser login flow into the native
/// store via the shell's deep-link listener.
pub struct HandoffBridge {
    store: Arc<dyn SessionStore>,
    platform: Platform,
    state: RwLock<HandoffState>,
    registered: AtomicBool,
}

impl HandoffBridge {
    pub fn new(store: Arc<dyn SessionStore>, platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            store,
            platform,
            state: RwLock::new(HandoffState::NotStarted),
            registered: AtomicBool::new(false),
        })
    }

    /// Mark the deep-link listener live. Must happen before the login browser
    /// context is opened, or a handoff URI firing early is lost. The returned
    /// guard releases the registration on every exit path.
    pub fn register(self: &Arc<Self>) -> HandoffGuard {
        self.registered.store(true, Ordering::SeqCst);
        debug!("deep-link listener registered");
        HandoffGuard {
            bridge: Arc::clone(self),
        }
    }

    pub async fn state(&self) -> HandoffState {
        *self.state.read().await
    }

    /// URL to open in the browser to start the login flow. Refused while the
    /// listener is not registered, since the handoff could never land.
    pub async fn login_url(&self, web_base: &Url) -> BridgeResult<Url> {
        if !self.registered.load(Ordering::SeqCst) {
            return Err(BridgeError::ListenerNotRegistered);
        }
        let url = desktop_entry_url(web_base, self.platform)?;
        *self.state.write().await = HandoffState::HandoffRequested;
        info!(platform = %self.platform, "opening browser login flow");
        Ok(url)
    }

    /// Deep-link callback. Returns `true` when the URI carried a session
    /// credential that is now stored; any other URI is a no-op so unrelated
    /// deep-link traffic passes through undisturbed.
    pub async fn handle_uri(&self, uri: &str) -> BridgeResult<bool> {
        if !self.registered.load(Ordering::SeqCst) {
            warn!("deep link received without a registered listener, dropping");
            return Ok(false);
        }

        let Some(token) = extract_handoff_token(uri) else {
            return Ok(false);
        };

        *self.state.write().await = HandoffState::Received;
        self.store.set(&token).await?;
        *self.state.write().await = HandoffState::Complete;
        info!("session credential received from browser handoff");
        Ok(true)
    }

    /// Tear down the native session and reset the handoff.
    pub async fn logout(&self) -> BridgeResult<()> {
        self.store.remove().await?;
        *self.state.write().await = HandoffState::NotStarted;
        Ok(())
    }
}

/// RAII registration for the deep-link listener, scoped to the lifetime of
/// the top-level application view.
pub struct HandoffGuard {
    bridge: Arc<HandoffBridge>,
}

impl Drop for HandoffGuard {
    fn drop(&mut self) {
        self.bridge.registered.store(false, Ordering::SeqCst);
        debug!("deep-link listener released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbook_identity_session::MemorySessionStore;

    fn bridge(platform: Platform) -> Arc<HandoffBridge> {
        HandoffBridge::new(Arc::new(MemorySessionStore::new()), platform)
    }

    #[tokio::test]
    async fn handoff_requires_registration() {
        let bridge = bridge(Platform::Linux);
        let web_base = Url::parse("https://app.example/").unwrap();

        assert!(bridge.login_url(&web_base).await.is_err());

        let handled = bridge.handle_uri("songbook://?token=tok").await.unwrap();
        assert!(!handled);
        assert_eq!(bridge.state().await, HandoffState::NotStarted);
    }

    #[tokio::test]
    async fn guard_releases_on_drop() {
        let bridge = bridge(Platform::Linux);

        {
            let _guard = bridge.register();
            assert!(bridge.handle_uri("songbook://?token=t").await.unwrap());
        }

        // Listener is gone; further URIs are dropped.
        assert!(!bridge.handle_uri("songbook://?token=t2").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_uris_leave_state_untouched() {
        let bridge = bridge(Platform::Linux);
        let _guard = bridge.register();
        let web_base = Url::parse("https://app.example/").unwrap();
        bridge.login_url(&web_base).await.unwrap();

        assert!(!bridge.handle_uri("???").await.unwrap());
        assert!(!bridge.handle_uri("songbook://play?id=7").await.unwrap());
        assert_eq!(bridge.state().await, HandoffState::HandoffRequested);
    }

    #[tokio::test]
    async fn logout_resets_the_bridge() {
        let bridge = bridge(Platform::Macos);
        let _guard = bridge.register();

        assert!(bridge.handle_uri("songbook://?token=tok").await.unwrap());
        assert_eq!(bridge.state().await, HandoffState::Complete);

        bridge.logout().await.unwrap();
        assert_eq!(bridge.state().await, HandoffState::NotStarted);
    }
}
