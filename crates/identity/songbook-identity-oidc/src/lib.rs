//! OpenID Connect Authorization Code client with PKCE.
//!
//! This crate drives the browser-side login flow against a single identity
//! provider: it discovers the provider metadata published by the songbook
//! backend, generates a PKCE verifier/challenge pair, builds the authorization
//! redirect, and exchanges the returned code (or a refresh token) for tokens.
//! Persisting the resulting session credential is the caller's job; transport
//! is kept separate from storage.

mod attempt;
mod client;
mod config;
mod discovery;
mod error;
mod types;


pub use attempt::{InMemoryAttemptStore, LoginAttempt, LoginAttemptStore};
pub use client::{OidcClient, PkceChallenge, build_authorization_url};
pub use config::OidcConfig;
pub use discovery::DiscoveryClient;
pub use error::{OidcError, OidcResult};
pub use types::{ProviderMetadata, TokenResponse};
