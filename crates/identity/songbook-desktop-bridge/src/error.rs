//! Handoff bridge error types.

use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The `/desktop` landing route was reached without a credential in the
    /// web store, e.g. the login flow was abandoned.
    #[error("No session credential available for handoff")]
    MissingSession,

    /// The login browser context would have been opened before the deep-link
    /// listener was live; a handoff firing then would be lost.
    #[error("Deep-link listener is not registered")]
    ListenerNotRegistered,

    #[error("Session error: {0}")]
    Session(#[from] songbook_identity_session::SessionError),
}
