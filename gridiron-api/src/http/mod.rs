// Module: http
// Routing and shared state for the JSON API.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod middleware;
pub mod session;

use std::sync::Arc;

use axum::{routing::get, Router};
use gridiron_core::oidc::ProviderRegistry;
use gridiron_core::service::{AuthService, SessionService};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};
pub use session::SessionCookieConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub auth_service: Arc<AuthService>,
    pub sessions: Arc<SessionService>,
    pub cookie_config: Arc<SessionCookieConfig>,
    pub environment: String,
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // everything past login lives behind the session check
    let authenticated = Router::new()
        .route("/v1/dashboard", get(dashboard::show))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_authenticated,
        ));

    Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        .route("/v1/providers", get(auth::list_providers))
        .route("/v1/auth/{provider}", get(auth::begin))
        .route("/v1/auth/{provider}/callback", get(auth::callback))
        .route("/v1/auth/{provider}/logout", get(auth::logout))
        .merge(authenticated)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
