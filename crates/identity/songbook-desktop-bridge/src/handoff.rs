//! Handoff URI construction and parsing.

use tracing::{debug, warn};
use url::Url;

use crate::error::{BridgeError, BridgeResult};
use crate::platform::Platform;
use songbook_identity_session::SessionStore;

/// Custom URI scheme registered by the native shell.
pub const HANDOFF_SCHEME: &str = "songbook";

/// Authority used on Windows, whose custom-URI handlers only fire for an
/// https-shaped URI.
const WINDOWS_HANDOFF_AUTHORITY: &str = "songbook.localhost";

/// Base URI the browser navigates to in order to reach the native shell.
///
/// Total over the supported platform set: Windows gets the https-shaped
/// authority variant, every other platform the bare custom scheme.
pub fn handoff_base_url(platform: Platform) -> BridgeResult<Url> {
    let url = match platform {
        Platform::Windows => Url::parse(&format!("https://{WINDOWS_HANDOFF_AUTHORITY}/"))?,
        _ => Url::parse(&format!("{HANDOFF_SCHEME}://"))?,
    };
    Ok(url)
}

/// URI the `/desktop` landing route navigates to, carrying the credential
/// into the native shell.
pub fn build_handoff_url(platform: Platform, token: &str) -> BridgeResult<Url> {
    let mut url = handoff_base_url(platform)?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// URL the native shell opens in the browser to start a login, landing on
/// the web app's `/desktop` route.
pub fn desktop_entry_url(web_base: &Url, platform: Platform) -> BridgeResult<Url> {
    let mut url = web_base.join("desktop")?;
    url.query_pairs_mut()
        .append_pair("platform", platform.as_str());
    Ok(url)
}

/// Mirror of [`desktop_entry_url`] for the logout path, so the web context
/// can clear its cookie before control returns to the shell.
pub fn logout_url(web_base: &Url, platform: Platform) -> BridgeResult<Url> {
    let mut url = web_base.join("logout")?;
    url.query_pairs_mut()
        .append_pair("platform", platform.as_str());
    Ok(url)
}

/// Landing-route behavior: read the freshly created credential from the web
/// store and produce the platform's handoff URI.
pub async fn handoff_redirect(
    web_store: &dyn SessionStore,
    platform: Platform,
) -> BridgeResult<Url> {
    let token = web_store.get().await?.ok_or(BridgeError::MissingSession)?;
    debug!(%platform, "handing session credential off to the native shell");
    build_handoff_url(platform, &token)
}

/// Pull the `token` parameter out of an incoming deep-link URI.
///
/// Malformed or unrelated URIs yield `None` and are only logged; the shell
/// receives other deep-link traffic on the same listener and must not be
/// destabilized by a bad payload.
pub fn extract_handoff_token(uri: &str) -> Option<String> {
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(err) => {
            warn!(%err, "ignoring malformed deep-link URI");
            return None;
        }
    };

    let token = url
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty());

    if token.is_none() {
        debug!("deep-link URI carries no token, ignoring");
    }
    token
}
