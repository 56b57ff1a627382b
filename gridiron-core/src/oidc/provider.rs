use std::fmt;

use openidconnect::core::{CoreClient, CoreProviderMetadata};
use openidconnect::{
    ClientId, ClientSecret, EndpointMaybeSet, EndpointNotSet, EndpointSet, RedirectUrl,
};

/// The mandatory identity scope; always first in a provider's scope list.
pub const SCOPE_OPENID: &str = "openid";

/// Scopes requested for every provider on top of [`SCOPE_OPENID`].
pub const DEFAULT_SCOPES: [&str; 2] = ["profile", "email"];

/// A `CoreClient` as produced from discovery metadata: authorization
/// endpoint known, token/userinfo endpoints present when the provider
/// advertises them.
pub type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// Static configuration for one identity provider, as handed to
/// [`crate::oidc::ProviderRegistry::register`]. Immutable after load.
#[derive(Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
    /// Provider-specific scopes on top of the defaults.
    pub scopes: Vec<String>,
    pub base_callback_url: String,
}

impl ProviderConfig {
    /// The redirect URI registered with the provider. Derived from the
    /// base URL and the provider name, so renaming a provider changes the
    /// URI the provider must have on file.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!(
            "{}/v1/auth/{}/callback",
            self.base_callback_url.trim_end_matches('/'),
            self.name
        )
    }
}

// Manual Debug: the client secret must never reach logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("scopes", &self.scopes)
            .field("base_callback_url", &self.base_callback_url)
            .finish()
    }
}

/// A provider after successful discovery: resolved endpoints, current
/// signing keys and the finalized client configuration. Owned by the
/// registry, shared immutably with request handlers.
pub struct RegisteredProvider {
    pub name: String,
    pub issuer: String,
    pub scopes: Vec<String>,
    client_id: String,
    client_secret: String,
    redirect_url: RedirectUrl,
    metadata: CoreProviderMetadata,
}

impl RegisteredProvider {
    pub(crate) fn new(
        config: &ProviderConfig,
        metadata: CoreProviderMetadata,
        redirect_url: RedirectUrl,
    ) -> Self {
        let mut scopes = Vec::with_capacity(3 + config.scopes.len());
        scopes.push(SCOPE_OPENID.to_string());
        scopes.extend(DEFAULT_SCOPES.iter().map(ToString::to_string));
        for scope in &config.scopes {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.clone());
            }
        }

        Self {
            name: config.name.clone(),
            issuer: config.issuer.clone(),
            scopes,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url,
            metadata,
        }
    }

    /// Rebuild the protocol client from the discovered metadata. The
    /// verifier obtained from it is scoped to this provider's client id
    /// and the signing keys fetched at registration.
    #[must_use]
    pub fn client(&self) -> DiscoveredClient {
        CoreClient::from_provider_metadata(
            self.metadata.clone(),
            ClientId::new(self.client_id.clone()),
            Some(ClientSecret::new(self.client_secret.clone())),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        self.redirect_url.as_str()
    }
}

impl fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("redirect_url", &self.redirect_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            name: "test".to_string(),
            client_id: "client".to_string(),
            client_secret: "super-secret".to_string(),
            issuer: "https://idp.example/".to_string(),
            scopes: vec!["email".to_string(), "groups".to_string()],
            base_callback_url: "http://localhost:4000/".to_string(),
        }
    }

    #[test]
    fn test_redirect_url_is_derived_from_name() {
        assert_eq!(
            config().redirect_url(),
            "http://localhost:4000/v1/auth/test/callback"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("super-secret"));
    }
}
