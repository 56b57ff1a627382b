//! End-to-end tests for the federated login flow against a fake identity
//! provider: wiremock serves the discovery document, JWKS and token
//! endpoint, and tokens are minted with a throwaway RSA key.
//!
//! Run with: cargo test --test auth_flow

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridiron_core::models::{Session, SessionData};
use gridiron_core::oidc::{OidcHttpClient, ProviderConfig, ProviderRegistry};
use gridiron_core::service::{AuthService, CallbackParams, SessionService};
use gridiron_core::session::MemorySessionStore;
use gridiron_core::Error;

const KEY_ID: &str = "test-key";
const CLIENT_ID: &str = "gridiron-client";

struct FakeIdp {
    server: MockServer,
    encoding_key: EncodingKey,
}

impl FakeIdp {
    async fn start() -> Self {
        let server = MockServer::start().await;

        let private_key =
            RsaPrivateKey::new(&mut rand_core::OsRng, 2048).expect("failed to generate RSA key");
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("failed to encode private key");
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).expect("failed to load signing key");

        let issuer = server.uri();
        let discovery = serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/authorize"),
            "token_endpoint": format!("{issuer}/token"),
            "jwks_uri": format!("{issuer}/jwks"),
            "userinfo_endpoint": format!("{issuer}/userinfo"),
            "response_types_supported": ["code"],
            "subject_types_supported": ["public"],
            "id_token_signing_alg_values_supported": ["RS256"],
            "scopes_supported": ["openid", "profile", "email"],
        });
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(discovery))
            .mount(&server)
            .await;

        let public_key = private_key.to_public_key();
        let jwks = serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": KEY_ID,
                "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
            }]
        });
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&server)
            .await;

        Self {
            server,
            encoding_key,
        }
    }

    fn issuer(&self) -> String {
        self.server.uri()
    }

    fn mint_id_token(&self, spec: &TokenSpec) -> String {
        #[derive(Serialize)]
        struct IdTokenClaims<'a> {
            iss: &'a str,
            sub: &'a str,
            aud: &'a str,
            exp: i64,
            iat: i64,
            nonce: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
        }

        let issuer = self.issuer();
        let claims = IdTokenClaims {
            iss: &issuer,
            sub: spec.subject,
            aud: spec.audience,
            exp: spec.expires_at,
            iat: spec.issued_at,
            nonce: spec.nonce,
            email: spec.email,
            name: spec.name,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KEY_ID.to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .expect("failed to sign id token")
    }

    /// Serve the given id_token from the token endpoint.
    async fn mount_token_endpoint(&self, id_token: &str) {
        let body = serde_json::json!({
            "access_token": "test-access-token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": id_token,
        });
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn token_endpoint_hits(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/token")
            .count()
    }
}

struct TokenSpec<'a> {
    subject: &'a str,
    audience: &'a str,
    nonce: &'a str,
    issued_at: i64,
    expires_at: i64,
    email: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> TokenSpec<'a> {
    fn valid(nonce: &'a str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            subject: "user-123",
            audience: CLIENT_ID,
            nonce,
            issued_at: now,
            expires_at: now + 3600,
            email: Some("u@example.com"),
            name: Some("Test User"),
        }
    }
}

fn provider_config(name: &str, issuer: String) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: "test-secret".to_string(),
        issuer,
        scopes: vec![],
        base_callback_url: "http://localhost:4000".to_string(),
    }
}

async fn registered_service(idp: &FakeIdp) -> (Arc<ProviderRegistry>, AuthService) {
    let http = OidcHttpClient::new(Duration::from_secs(5)).expect("http client");
    let registry = Arc::new(ProviderRegistry::new(http.clone()));
    registry
        .register(provider_config("test", idp.issuer()))
        .await
        .expect("registration against the fake IdP should succeed");
    (registry.clone(), AuthService::new(registry, http))
}

fn callback_params(state: Option<&str>, code: Option<&str>) -> CallbackParams {
    CallbackParams {
        code: code.map(ToString::to_string),
        state: state.map(ToString::to_string),
        error: None,
        error_description: None,
    }
}

#[tokio::test]
async fn test_begin_stores_state_and_builds_authorization_url() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    let url = auth.begin("test", &mut session).await.unwrap();

    let pending = session.pending_auth.as_ref().expect("state stored in session");
    assert_eq!(pending.provider, "test");
    assert!(pending.state.len() >= 43); // 32 bytes of entropy, base64url

    assert!(url.as_str().starts_with(&format!("{}/authorize", idp.issuer())));
    let query: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(query.get("state"), Some(&pending.state));
    assert_eq!(query.get("nonce"), Some(&pending.nonce));
    assert_eq!(query.get("client_id"), Some(&CLIENT_ID.to_string()));
    assert_eq!(
        query.get("redirect_uri"),
        Some(&"http://localhost:4000/v1/auth/test/callback".to_string())
    );
    let scope = query.get("scope").expect("scope param");
    assert!(scope.contains("openid"));
    assert!(scope.contains("profile"));
    assert!(scope.contains("email"));
}

#[tokio::test]
async fn test_full_login_flow_establishes_authenticated_session() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = Session::new();
    auth.begin("test", &mut session.data).await.unwrap();
    let pending = session.data.pending_auth.clone().unwrap();

    let id_token = idp.mint_id_token(&TokenSpec::valid(&pending.nonce));
    idp.mount_token_endpoint(&id_token).await;

    let claims = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("valid-code")),
            &mut session.data,
        )
        .await
        .unwrap();

    assert_eq!(claims.subject, "user-123");
    assert_eq!(claims.email.as_deref(), Some("u@example.com"));
    assert_eq!(claims.name.as_deref(), Some("Test User"));
    assert!(session.data.pending_auth.is_none(), "state is single-use");

    let sessions = SessionService::new(
        Arc::new(MemorySessionStore::new()),
        Duration::from_secs(3600),
    );
    sessions
        .establish(&mut session, "test", &claims)
        .await
        .unwrap();
    assert!(session.data.authenticated);
    assert_eq!(session.data.provider.as_deref(), Some("test"));
    assert_eq!(session.data.subject.as_deref(), Some("user-123"));
}

#[tokio::test]
async fn test_state_replay_is_rejected() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = Session::new();
    auth.begin("test", &mut session.data).await.unwrap();
    let pending = session.data.pending_auth.clone().unwrap();

    let id_token = idp.mint_id_token(&TokenSpec::valid(&pending.nonce));
    idp.mount_token_endpoint(&id_token).await;

    let params = callback_params(Some(&pending.state), Some("valid-code"));
    auth.callback("test", &params, &mut session.data)
        .await
        .unwrap();

    // second delivery of the same callback: the state was consumed
    let err = auth
        .callback("test", &params, &mut session.data)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState));
}

#[tokio::test]
async fn test_tampered_state_fails_before_any_exchange() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();

    let err = auth
        .callback(
            "test",
            &callback_params(Some("wrong-state"), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState));
    assert!(session.pending_auth.is_none(), "failed attempt is consumed too");
    assert_eq!(idp.token_endpoint_hits().await, 0);
}

#[tokio::test]
async fn test_missing_state_and_missing_session_are_rejected() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    // no Begin ever happened for this session
    let mut fresh = SessionData::default();
    let err = auth
        .callback(
            "test",
            &callback_params(Some("anything"), Some("code")),
            &mut fresh,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState));

    // Begin happened but the provider sent no state back
    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let err = auth
        .callback("test", &callback_params(None, Some("code")), &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState));
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let idp = FakeIdp::start().await;
    let (registry, auth) = registered_service(&idp).await;

    assert!(registry.lookup("nonexistent").await.is_none());
    assert!(!registry.is_registered("nonexistent").await);

    let mut session = SessionData::default();
    let err = auth.begin("nonexistent", &mut session).await.unwrap_err();
    assert!(matches!(err, Error::UnknownProvider(_)));

    let err = auth
        .callback(
            "nonexistent",
            &callback_params(Some("s"), Some("c")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownProvider(_)));
}

#[tokio::test]
async fn test_expired_token_fails_verification() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    let now = Utc::now().timestamp();
    let spec = TokenSpec {
        issued_at: now - 7200,
        expires_at: now - 3600,
        ..TokenSpec::valid(&pending.nonce)
    };
    idp.mount_token_endpoint(&idp.mint_id_token(&spec)).await;

    let err = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TokenVerification(_)));
}

#[tokio::test]
async fn test_wrong_audience_fails_verification() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    let spec = TokenSpec {
        audience: "some-other-client",
        ..TokenSpec::valid(&pending.nonce)
    };
    idp.mount_token_endpoint(&idp.mint_id_token(&spec)).await;

    let err = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TokenVerification(_)));
}

#[tokio::test]
async fn test_wrong_nonce_fails_verification() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    idp.mount_token_endpoint(&idp.mint_id_token(&TokenSpec::valid("some-other-nonce")))
        .await;

    let err = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TokenVerification(_)));
}

#[tokio::test]
async fn test_token_response_without_id_token_is_rejected() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    // plain OAuth2 response: access token only
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-access-token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(&idp.server)
        .await;

    let err = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingIdentityToken));
}

#[tokio::test]
async fn test_provider_error_response_fails_exchange() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    let params = CallbackParams {
        code: None,
        state: Some(pending.state.clone()),
        error: Some("access_denied".to_string()),
        error_description: Some("user cancelled".to_string()),
    };
    let err = auth.callback("test", &params, &mut session).await.unwrap_err();
    assert!(matches!(err, Error::Exchange(_)));
}

#[tokio::test]
async fn test_token_endpoint_failure_is_exchange_error() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let pending = session.pending_auth.clone().unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "code expired",
        })))
        .mount(&idp.server)
        .await;

    let err = auth
        .callback(
            "test",
            &callback_params(Some(&pending.state), Some("stale-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Exchange(_)));
}

#[tokio::test]
async fn test_registration_fails_cleanly_when_discovery_is_unreachable() {
    let http = OidcHttpClient::new(Duration::from_secs(1)).expect("http client");
    let registry = Arc::new(ProviderRegistry::new(http));

    // nothing listens on this port
    let err = registry
        .register(provider_config(
            "broken",
            "http://127.0.0.1:1/".to_string(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProviderInit { .. }));
    assert!(!registry.is_registered("broken").await);
}

#[tokio::test]
async fn test_concurrent_registration_keeps_both_providers() {
    let idp = FakeIdp::start().await;
    let http = OidcHttpClient::new(Duration::from_secs(5)).expect("http client");
    let registry = Arc::new(ProviderRegistry::new(http));

    let (a, b) = tokio::join!(
        registry.register(provider_config("a", idp.issuer())),
        registry.register(provider_config("b", idp.issuer())),
    );
    a.unwrap();
    b.unwrap();

    assert!(registry.is_registered("a").await);
    assert!(registry.is_registered("b").await);
    assert_eq!(registry.provider_names().await, vec!["a", "b"]);

    let a = registry.lookup("a").await.unwrap();
    let b = registry.lookup("b").await.unwrap();
    assert_eq!(a.redirect_url(), "http://localhost:4000/v1/auth/a/callback");
    assert_eq!(b.redirect_url(), "http://localhost:4000/v1/auth/b/callback");
}

#[tokio::test]
async fn test_new_begin_invalidates_earlier_attempt() {
    let idp = FakeIdp::start().await;
    let (_registry, auth) = registered_service(&idp).await;

    let mut session = SessionData::default();
    auth.begin("test", &mut session).await.unwrap();
    let first = session.pending_auth.clone().unwrap();

    auth.begin("test", &mut session).await.unwrap();
    let second = session.pending_auth.clone().unwrap();
    assert_ne!(first.state, second.state);

    // the first attempt's state no longer matches
    let err = auth
        .callback(
            "test",
            &callback_params(Some(&first.state), Some("valid-code")),
            &mut session,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState));
}
