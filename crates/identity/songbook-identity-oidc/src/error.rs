//! OIDC client error types.

use thiserror::Error;

pub type OidcResult<T> = Result<T, OidcError>;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid discovery document: {0}")]
    InvalidDiscovery(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The callback arrived without a pending login attempt. The attempt was
    /// either never started, already consumed, or overwritten by a newer one.
    #[error("No login attempt is pending")]
    NoPendingAttempt,

    /// The `state` parameter on the callback does not match the pending
    /// attempt. Treated as fatal to the attempt, never retried.
    #[error("State parameter mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// The OS secure random source failed. The login flow fails closed
    /// rather than falling back to a weaker source.
    #[error("Secure random source unavailable: {0}")]
    RandomSource(String),
}
