//! OIDC protocol types.

use serde::{Deserialize, Serialize};

/// Provider metadata served by the backend's discovery route.
///
/// Fetched fresh for every operation; a changed provider configuration must
/// never be outlived by a cached copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub client_id: String,
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Error payload a well-behaved provider returns on a failed exchange.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}
