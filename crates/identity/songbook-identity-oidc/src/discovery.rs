//! Provider metadata discovery.

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{OidcError, OidcResult};
use crate::types::ProviderMetadata;

/// Fetches the provider metadata document from the backend's discovery route.
#[derive(Clone)]
pub struct DiscoveryClient {
    http_client: Client,
    discovery_url: Url,
}

impl DiscoveryClient {
    pub fn new(http_client: Client, discovery_url: Url) -> Self {
        Self {
            http_client,
            discovery_url,
        }
    }

    /// Single network read of the discovery document. Any transport or parse
    /// error surfaces to the caller, which must abort its operation rather
    /// than proceed with partial metadata.
    pub async fn discover(&self) -> OidcResult<ProviderMetadata> {
        let response = self
            .http_client
            .get(self.discovery_url.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OidcError::InvalidDiscovery(format!(
                "discovery route returned {}",
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidDiscovery(e.to_string()))?;

        debug!(issuer = %metadata.issuer, "fetched provider metadata");
        Ok(metadata)
    }
}
