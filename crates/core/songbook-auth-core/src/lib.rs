//! Session credential claims and unverified decoding.
//!
//! The session credential is a signed JWT issued by the backend. Clients only
//! decode it to drive display and UI gating; they never verify the signature.
//! The server remains the authority for every security-sensitive decision,
//! which is why the decoding entry point is named [`decode_unverified`].

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the session cookie on the web, and of the session key in the
/// native shell's persisted store.
pub const SESSION_TOKEN_NAME: &str = "songbook_session";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is not a three-segment JWT compact form, or a segment is
    /// not valid base64url.
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid claims payload: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Decoded payload of a session credential.
///
/// Claims are derived from the stored token on every read and never mutated;
/// a new credential fully replaces the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,

    // Profile fields, all optional in the issued token.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,

    // Permission scopes granted at issuance time.
    #[serde(default)]
    pub manage: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub profile: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl Claims {
    /// A credential whose expiry has passed is equivalent to no session.
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Decodes the claims payload of a JWT compact token WITHOUT verifying the
/// cryptographic signature.
///
/// Signature trust is established at issuance time by the server that set the
/// cookie or answered the token exchange. Callers must not treat a successful
/// decode as a security check.
pub fn decode_unverified(token: &str) -> AuthResult<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;

    Ok(serde_json::from_slice(&bytes)?)
}
