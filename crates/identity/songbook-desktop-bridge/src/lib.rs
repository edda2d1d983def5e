//! Browser-to-native session handoff.
//!
//! The desktop shell cannot log in on its own: the OIDC flow runs in a
//! browser context, so the freshly issued session credential has to cross the
//! process boundary. The browser side lands on the `/desktop` route, reads
//! the credential from the web store, and navigates to a custom-scheme URI;
//! the shell's deep-link listener receives it and writes the credential into
//! the native store.

mod bridge;
mod error;
mod handoff;
mod platform;

pub use bridge::{HandoffBridge, HandoffGuard, HandoffState};
pub use error::{BridgeError, BridgeResult};
pub use handoff::{
    HANDOFF_SCHEME, build_handoff_url, desktop_entry_url, extract_handoff_token, handoff_redirect,
    logout_url,
};
pub use platform::Platform;
