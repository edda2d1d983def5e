//! Current-session view over the selected store backend.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::store::SessionStore;
use crate::SessionResult;
use songbook_auth_core::{Claims, decode_unverified};

/// Read-mostly facade the rest of the UI consults for identity and
/// permission state.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    /// Raw stored credential, for callers that attach it as a bearer header.
    pub async fn session_token(&self) -> SessionResult<Option<String>> {
        self.store.get().await
    }

    pub async fn set_session(&self, token: &str) -> SessionResult<()> {
        self.store.set(token).await
    }

    pub async fn clear_session(&self) -> SessionResult<()> {
        self.store.remove().await
    }

    /// Claims of the current session, or `None` when no credential is stored
    /// or the stored one has expired.
    ///
    /// Expiry is evaluated against the wall clock on every call; an expired
    /// credential is silently demoted to "no session", which is the expected
    /// path driving a fresh login prompt. An undecodable credential is
    /// demoted the same way.
    pub async fn current_claims(&self) -> SessionResult<Option<Claims>> {
        let Some(token) = self.store.get().await? else {
            return Ok(None);
        };

        let claims = match decode_unverified(&token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(%err, "stored session credential does not decode");
                return Ok(None);
            }
        };

        if claims.is_expired(Utc::now().timestamp()) {
            debug!("stored session credential has expired");
            return Ok(None);
        }

        Ok(Some(claims))
    }

    pub async fn is_admin(&self) -> bool {
        self.flag(|c| c.is_admin).await
    }

    pub async fn can_manage(&self) -> bool {
        self.flag(|c| c.manage).await
    }

    pub async fn is_read_only(&self) -> bool {
        self.flag(|c| c.read_only).await
    }

    pub async fn has_profile(&self) -> bool {
        self.flag(|c| c.profile).await
    }

    async fn flag(&self, f: impl FnOnce(&Claims) -> bool) -> bool {
        match self.current_claims().await {
            Ok(Some(claims)) => f(&claims),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{payload}.sig")
    }

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn fresh_visitor_has_no_claims() {
        let manager = manager();
        assert!(manager.current_claims().await.unwrap().is_none());
        assert!(!manager.is_admin().await);
        assert!(!manager.can_manage().await);
    }

    #[tokio::test]
    async fn valid_credential_yields_claims() {
        let manager = manager();
        let exp = Utc::now().timestamp() + 3600;
        let token = make_token(&serde_json::json!({
            "sub": "user-1",
            "exp": exp,
            "manage": true,
            "is_admin": false,
        }));
        manager.set_session(&token).await.unwrap();

        let claims = manager.current_claims().await.unwrap().unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(manager.can_manage().await);
        assert!(!manager.is_admin().await);
    }

    #[tokio::test]
    async fn expired_credential_is_no_session() {
        let manager = manager();
        let token = make_token(&serde_json::json!({
            "sub": "user-1",
            "exp": Utc::now().timestamp() - 1,
            "is_admin": true,
        }));
        manager.set_session(&token).await.unwrap();

        // The raw stored string is still there, but the session is gone.
        assert!(manager.session_token().await.unwrap().is_some());
        assert!(manager.current_claims().await.unwrap().is_none());
        assert!(!manager.is_admin().await);
    }

    #[tokio::test]
    async fn undecodable_credential_is_no_session() {
        let manager = manager();
        manager.set_session("garbage").await.unwrap();
        assert!(manager.current_claims().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_flag_requires_claims() {
        let manager = manager();
        let token = make_token(&serde_json::json!({
            "sub": "admin",
            "exp": Utc::now().timestamp() + 3600,
            "is_admin": true,
        }));
        manager.set_session(&token).await.unwrap();
        assert!(manager.is_admin().await);

        manager.clear_session().await.unwrap();
        assert!(!manager.is_admin().await);
    }

    #[tokio::test]
    async fn new_credential_replaces_old() {
        let manager = manager();
        let exp = Utc::now().timestamp() + 3600;
        manager
            .set_session(&make_token(&serde_json::json!({"sub": "a", "exp": exp})))
            .await
            .unwrap();
        manager
            .set_session(&make_token(&serde_json::json!({"sub": "b", "exp": exp})))
            .await
            .unwrap();

        let claims = manager.current_claims().await.unwrap().unwrap();
        assert_eq!(claims.sub, "b");
    }
}
