use std::collections::HashMap;
use std::sync::Arc;

use openidconnect::core::CoreProviderMetadata;
use openidconnect::{IssuerUrl, RedirectUrl};
use tokio::sync::RwLock;
use tracing::info;

use super::http::OidcHttpClient;
use super::provider::{ProviderConfig, RegisteredProvider};
use crate::{Error, Result};

/// Thread-safe map of provider name to [`RegisteredProvider`].
///
/// Writes happen at startup/reconfiguration, reads on every auth request.
/// Discovery runs without the lock held, so registering several providers
/// concurrently parallelizes the network fetches while map writes stay
/// serialized; a lookup can never observe a half-built entry.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<RegisteredProvider>>>,
    http: OidcHttpClient,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(http: OidcHttpClient) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            http,
        }
    }

    /// Fetch the issuer's discovery document, build the verifier-bearing
    /// provider entry and insert it under `config.name`, replacing any
    /// previous entry of that name.
    ///
    /// On failure the registry is left unchanged for that name.
    pub async fn register(&self, config: ProviderConfig) -> Result<()> {
        if config.name.is_empty() {
            return Err(Error::ProviderInit {
                provider: "<unnamed>".to_string(),
                reason: "provider name must not be empty".to_string(),
            });
        }
        if config.client_id.is_empty() {
            return Err(Error::ProviderInit {
                provider: config.name.clone(),
                reason: "client_id must not be empty".to_string(),
            });
        }

        let issuer = IssuerUrl::new(config.issuer.clone()).map_err(|e| Error::ProviderInit {
            provider: config.name.clone(),
            reason: format!("invalid issuer URL: {e}"),
        })?;
        let redirect_url =
            RedirectUrl::new(config.redirect_url()).map_err(|e| Error::ProviderInit {
                provider: config.name.clone(),
                reason: format!("invalid redirect URL: {e}"),
            })?;

        // Discovery also pulls the issuer's current signing keys; both
        // happen before the write lock is taken.
        let metadata = CoreProviderMetadata::discover_async(issuer, &self.http)
            .await
            .map_err(|e| Error::ProviderInit {
                provider: config.name.clone(),
                reason: format!("discovery failed: {e}"),
            })?;

        let provider = Arc::new(RegisteredProvider::new(&config, metadata, redirect_url));

        let mut providers = self.providers.write().await;
        providers.insert(provider.name.clone(), provider.clone());
        drop(providers);

        info!(
            provider = %provider.name,
            issuer = %provider.issuer,
            redirect_url = %provider.redirect_url(),
            "registered identity provider"
        );
        Ok(())
    }

    /// Shared-lock read; `None` for names never registered so callers can
    /// answer with a not-found instead of failing hard.
    pub async fn lookup(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.providers.read().await.get(name).cloned()
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.providers.read().await.contains_key(name)
    }

    /// Registered provider names, sorted for stable presentation.
    pub async fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_empty(&self) -> bool {
        self.providers.read().await.is_empty()
    }
}
