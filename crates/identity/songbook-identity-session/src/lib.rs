//! Session credential storage and the logged-in view of the current user.
//!
//! The credential lives in one of two interchangeable backends selected once
//! per process: a cookie jar on the web (so same-site requests carry it
//! automatically) or a JSON key/value file private to the native shell. All
//! callers depend only on the [`SessionStore`] trait; the backend choice is
//! invisible past startup.

mod manager;
mod player;
mod store;

use thiserror::Error;

pub use manager::SessionManager;
pub use player::{PLAYER_TOKEN_KEY, PlayerTokenIssuer, PlayerTokenService};
pub use store::{
    CookieSessionStore, Environment, FileSessionStore, KeyValueStore, MemorySessionStore,
    SessionStore, StoreConfig, session_store_for,
};

// Re-exported so store callers can name the claims types without a separate
// dependency on the core crate.
pub use songbook_auth_core::{Claims, SESSION_TOKEN_NAME, decode_unverified};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Token issuer error: {0}")]
    Issuer(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
