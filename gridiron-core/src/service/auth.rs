//! Browser-facing halves of the authorization-code flow.
//!
//! [`AuthService::begin`] starts an attempt and [`AuthService::callback`]
//! finishes it. The callback is a strict linear sequence with no retry of
//! partial progress: state check, code exchange, ID-token extraction,
//! verification, claim extraction. The first failing step aborts the whole
//! callback, each with its own error variant so operators can tell a CSRF
//! mismatch from a broken provider integration, while the HTTP layer shows
//! the browser one uniform failure.

use std::sync::Arc;

use chrono::Utc;
use openidconnect::core::CoreAuthenticationFlow;
use openidconnect::{AuthorizationCode, CsrfToken, Nonce, RequestTokenError, Scope};
use tracing::{debug, error, warn};
use url::Url;

use crate::models::{IdentityClaims, PendingAuth, SessionData};
use crate::oidc::provider::SCOPE_OPENID;
use crate::oidc::{state, OidcHttpClient, ProviderRegistry};
use crate::{Error, Result};

/// Tolerated clock skew when checking the token's issued-at claim.
const MAX_ISSUED_AT_SKEW_SECS: i64 = 300;

/// Query parameters delivered to the callback endpoint.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub struct AuthService {
    registry: Arc<ProviderRegistry>,
    http: OidcHttpClient,
}

impl AuthService {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, http: OidcHttpClient) -> Self {
        Self { registry, http }
    }

    /// Start an authorization attempt: generate fresh state and nonce,
    /// record them in the session and return the provider's authorization
    /// URL.
    ///
    /// Overwrites any earlier pending attempt for this session; the caller
    /// must persist the session before redirecting the browser, and fail
    /// closed if that save fails.
    pub async fn begin(&self, provider_name: &str, session: &mut SessionData) -> Result<Url> {
        let provider = self
            .registry
            .lookup(provider_name)
            .await
            .ok_or_else(|| Error::UnknownProvider(provider_name.to_string()))?;

        let state = state::generate_state();
        let nonce = state::generate_nonce();

        let client = provider.client();
        let state_for_closure = state.clone();
        let nonce_for_closure = nonce.clone();
        let mut request = client.authorize_url(
            CoreAuthenticationFlow::AuthorizationCode,
            move || CsrfToken::new(state_for_closure),
            move || Nonce::new(nonce_for_closure),
        );
        // The library injects the openid scope itself; add the rest.
        for scope in provider.scopes.iter().filter(|s| *s != SCOPE_OPENID) {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (authorize_url, _csrf, _nonce) = request.url();

        session.pending_auth = Some(PendingAuth {
            provider: provider.name.clone(),
            state,
            nonce,
            created_at: Utc::now(),
        });

        debug!(provider = %provider.name, "authorization flow started");
        Ok(authorize_url)
    }

    /// Process the provider's redirect back to us and return the verified
    /// identity. The pending state is consumed even when validation fails,
    /// so a state value can never be replayed.
    pub async fn callback(
        &self,
        provider_name: &str,
        params: &CallbackParams,
        session: &mut SessionData,
    ) -> Result<IdentityClaims> {
        let provider = self
            .registry
            .lookup(provider_name)
            .await
            .ok_or_else(|| Error::UnknownProvider(provider_name.to_string()))?;

        // State validation. Everything here is local; no network call is
        // made until the state has been accepted.
        let pending = session.pending_auth.take().ok_or_else(|| {
            warn!(provider = %provider.name, "callback without a pending attempt");
            Error::InvalidState
        })?;
        let received = params.state.as_deref().ok_or(Error::InvalidState)?;
        if !state::states_match(&pending.state, received) || pending.provider != provider.name {
            warn!(provider = %provider.name, "callback state mismatch");
            return Err(Error::InvalidState);
        }

        // The provider may answer with an error instead of a code.
        if let Some(error_code) = &params.error {
            error!(
                provider = %provider.name,
                error = %error_code,
                description = params.error_description.as_deref().unwrap_or(""),
                "provider returned an authorization error"
            );
            return Err(Error::Exchange(
                "provider rejected the authorization request".to_string(),
            ));
        }
        let code = params
            .code
            .as_deref()
            .ok_or_else(|| Error::Exchange("callback carried no authorization code".to_string()))?;

        // Code exchange, authenticated with the registered client
        // credentials and bounded by the shared client timeout.
        let client = provider.client();
        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| Error::Exchange(format!("token endpoint not available: {e}")))?
            .request_async(&self.http)
            .await
            .map_err(|err| {
                // Status and body go to the log only; the browser-facing
                // message stays generic.
                if let RequestTokenError::ServerResponse(response) = &err {
                    error!(
                        provider = %provider.name,
                        response = ?response,
                        "token endpoint rejected the code exchange"
                    );
                } else {
                    error!(provider = %provider.name, error = %err, "code exchange failed");
                }
                Error::Exchange("code exchange with identity provider failed".to_string())
            })?;

        let id_token = token_response
            .extra_fields()
            .id_token()
            .ok_or(Error::MissingIdentityToken)?;

        // Signature against the provider's current keys plus the standard
        // claim checks (issuer, audience, expiry, nonce).
        let verifier = client.id_token_verifier();
        let claims = id_token
            .claims(&verifier, &Nonce::new(pending.nonce.clone()))
            .map_err(|e| {
                warn!(provider = %provider.name, error = %e, "identity token rejected");
                Error::TokenVerification(e.to_string())
            })?;

        // The verifier checks expiry; the issued-at bound needs an
        // explicit check.
        let skew = chrono::Duration::seconds(MAX_ISSUED_AT_SKEW_SECS);
        if claims.issue_time() > Utc::now() + skew {
            warn!(provider = %provider.name, "identity token issued in the future");
            return Err(Error::TokenVerification(
                "token issued-at is in the future".to_string(),
            ));
        }

        let subject = claims.subject().to_string();
        if subject.is_empty() {
            return Err(Error::MalformedClaims(
                "identity token has an empty subject".to_string(),
            ));
        }
        let email = claims.email().map(|e| e.to_string());
        let name = claims
            .name()
            .and_then(|localized| localized.get(None))
            .map(|n| n.to_string());

        debug!(provider = %provider.name, "identity token verified");
        Ok(IdentityClaims {
            subject,
            email,
            name,
        })
    }
}
