//! OIDC client configuration.

use url::Url;

/// Configuration for [`crate::OidcClient`], resolved once at startup.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Discovery route of the songbook backend.
    pub discovery_url: Url,
    /// Redirect URI registered with the provider, sent verbatim on both the
    /// authorization request and the token exchange.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub http_timeout_seconds: u64,
}

impl OidcConfig {
    pub fn new(discovery_url: Url, redirect_uri: impl Into<String>) -> Self {
        Self {
            discovery_url,
            redirect_uri: redirect_uri.into(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
            http_timeout_seconds: 30,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}
