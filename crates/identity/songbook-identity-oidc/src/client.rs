//! Authorization Code flow client with PKCE.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use crate::attempt::{LoginAttempt, LoginAttemptStore};
use crate::config::OidcConfig;
use crate::discovery::DiscoveryClient;
use crate::error::{OidcError, OidcResult};
use crate::types::{ProviderMetadata, TokenErrorResponse, TokenResponse};

/// PKCE code verifier and derived challenge.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl PkceChallenge {
    /// Generate a fresh verifier/challenge pair.
    ///
    /// The verifier is 64 bytes from the OS secure random source, base64url
    /// encoded (86 characters, within the 43-128 required by RFC 7636). If
    /// the source fails the generation fails closed.
    pub fn new() -> OidcResult<Self> {
        let code_verifier = Self::generate_code_verifier()?;
        let code_challenge = Self::derive_challenge(&code_verifier);

        Ok(Self {
            code_verifier,
            code_challenge,
            code_challenge_method: "S256".to_string(),
        })
    }

    fn generate_code_verifier() -> OidcResult<String> {
        let mut bytes = [0u8; 64];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| OidcError::RandomSource(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// base64url(SHA-256(verifier)), no padding. Pure function of its input;
    /// the provider recomputes this byte for byte.
    pub fn derive_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// Deterministically assemble the provider's authorization URL.
pub fn build_authorization_url(
    metadata: &ProviderMetadata,
    challenge: &PkceChallenge,
    state: &str,
    redirect_uri: &str,
    scopes: &[String],
) -> OidcResult<Url> {
    let mut url = Url::parse(&metadata.authorization_endpoint)?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &metadata.client_id);
        params.append_pair("scope", &scopes.join(" "));
        params.append_pair("code_challenge_method", &challenge.code_challenge_method);
        params.append_pair("code_challenge", &challenge.code_challenge);
        params.append_pair("redirect_uri", redirect_uri);
        params.append_pair("state", state);
    }

    Ok(url)
}

/// Client for the full login flow: discovery, redirect, code exchange.
#[derive(Clone)]
pub struct OidcClient {
    http_client: Client,
    config: OidcConfig,
    discovery: DiscoveryClient,
    attempts: Arc<dyn LoginAttemptStore>,
}

impl OidcClient {
    pub fn new(config: OidcConfig, attempts: Arc<dyn LoginAttemptStore>) -> OidcResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;
        let discovery = DiscoveryClient::new(http_client.clone(), config.discovery_url.clone());

        Ok(Self {
            http_client,
            config,
            discovery,
            attempts,
        })
    }

    pub fn discovery(&self) -> &DiscoveryClient {
        &self.discovery
    }

    /// Start a login attempt and return the authorization URL to navigate to.
    ///
    /// The pending attempt is fully persisted before the URL is handed back,
    /// so the caller may trigger the navigation immediately.
    pub async fn start_login(&self) -> OidcResult<Url> {
        let metadata = self.discovery.discover().await?;
        let pkce = PkceChallenge::new()?;
        let state = Uuid::new_v4().to_string();

        let url = build_authorization_url(
            &metadata,
            &pkce,
            &state,
            &self.config.redirect_uri,
            &self.config.scopes,
        )?;

        self.attempts
            .save(LoginAttempt::new(state, pkce.code_verifier))
            .await?;

        debug!("generated authorization URL");
        Ok(url)
    }

    /// Complete the attempt started by [`start_login`](Self::start_login)
    /// with the code and state returned on the callback.
    pub async fn complete_login(&self, code: &str, state: &str) -> OidcResult<TokenResponse> {
        let attempt = self
            .attempts
            .take()
            .await?
            .ok_or(OidcError::NoPendingAttempt)?;

        if attempt.state != state {
            return Err(OidcError::StateMismatch);
        }

        let metadata = self.discovery.discover().await?;
        self.exchange_code(&metadata, code, &attempt.code_verifier)
            .await
    }

    /// Trade an authorization code for tokens. No store side effects;
    /// persistence is the caller's responsibility.
    pub async fn exchange_code(
        &self,
        metadata: &ProviderMetadata,
        code: &str,
        code_verifier: &str,
    ) -> OidcResult<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", metadata.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self.post_token(metadata, &params).await?;
        info!("exchanged authorization code for tokens");
        Ok(response)
    }

    /// Trade a refresh token for a new token set.
    pub async fn refresh(
        &self,
        metadata: &ProviderMetadata,
        refresh_token: &str,
    ) -> OidcResult<TokenResponse> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", metadata.client_id.as_str()),
        ];

        let response = self.post_token(metadata, &params).await?;
        debug!("refreshed session tokens");
        Ok(response)
    }

    async fn post_token(
        &self,
        metadata: &ProviderMetadata,
        params: &[(&str, &str)],
    ) -> OidcResult<TokenResponse> {
        let response = self
            .http_client
            .post(&metadata.token_endpoint)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => body,
            };
            error!("token endpoint rejected the request: {detail}");
            return Err(OidcError::TokenExchange(detail));
        }

        response
            .json()
            .await
            .map_err(|e| OidcError::InvalidTokenResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_verifier_is_long_and_url_safe() {
        let pkce = PkceChallenge::new().unwrap();
        assert!(pkce.code_verifier.len() >= 43);
        assert!(pkce.code_verifier.len() <= 128);
        assert!(
            pkce.code_verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(pkce.code_challenge_method, "S256");
    }

    #[test]
    fn pkce_pairs_are_unique() {
        let a = PkceChallenge::new().unwrap();
        let b = PkceChallenge::new().unwrap();
        assert_ne!(a.code_verifier, b.code_verifier);
        assert_ne!(a.code_challenge, b.code_challenge);
    }

    #[test]
    fn challenge_matches_reference_vectors() {
        // Independently computed SHA-256/base64url-no-padding values.
        assert_eq!(
            PkceChallenge::derive_challenge("abc123"),
            "bKE9UspwyIPg8LsQHkJaiehiTeUdstI5JZOvaoQRgJA"
        );
        // RFC 7636 appendix B.
        assert_eq!(
            PkceChallenge::derive_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn challenge_is_deterministic() {
        let pkce = PkceChallenge::new().unwrap();
        assert_eq!(
            pkce.code_challenge,
            PkceChallenge::derive_challenge(&pkce.code_verifier)
        );
    }

    #[test]
    fn authorization_url_carries_exactly_the_expected_query() {
        let metadata = ProviderMetadata {
            issuer: "https://idp.example".to_string(),
            authorization_endpoint: "https://idp.example/auth".to_string(),
            token_endpoint: "https://idp.example/token".to_string(),
            jwks_uri: "https://idp.example/jwks".to_string(),
            client_id: "abc".to_string(),
        };
        let challenge = PkceChallenge {
            code_verifier: "unused".to_string(),
            code_challenge: "XYZ".to_string(),
            code_challenge_method: "S256".to_string(),
        };
        let scopes = vec![
            "openid".to_string(),
            "profile".to_string(),
            "email".to_string(),
        ];

        let url = build_authorization_url(
            &metadata,
            &challenge,
            "state-1",
            "https://app.example/callback",
            &scopes,
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("idp.example"));
        assert_eq!(url.path(), "/auth");

        let params: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("response_type").map(|v| v.as_ref()), Some("code"));
        assert_eq!(params.get("client_id").map(|v| v.as_ref()), Some("abc"));
        assert_eq!(
            params.get("scope").map(|v| v.as_ref()),
            Some("openid profile email")
        );
        assert_eq!(
            params.get("code_challenge_method").map(|v| v.as_ref()),
            Some("S256")
        );
        assert_eq!(params.get("code_challenge").map(|v| v.as_ref()), Some("XYZ"));
        assert_eq!(
            params.get("redirect_uri").map(|v| v.as_ref()),
            Some("https://app.example/callback")
        );
        assert_eq!(params.get("state").map(|v| v.as_ref()), Some("state-1"));
        assert_eq!(params.len(), 7);
    }
}
