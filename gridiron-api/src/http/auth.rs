//! Federated login HTTP handlers
//!
//! GET /v1/auth/{provider}           - redirect the browser to the provider
//! GET /v1/auth/{provider}/callback  - finish the flow, establish the session
//! GET /v1/auth/{provider}/logout    - terminate the session

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use tracing::{error, info};

use gridiron_core::service::CallbackParams;

use super::{session, AppResult, AppState};

/// Query params the provider sends to the callback endpoint.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl From<CallbackQuery> for CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        Self {
            code: query.code,
            state: query.state,
            error: query.error,
            error_description: query.error_description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Start the authorization-code flow for a provider.
pub async fn begin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    cookies: Cookies,
) -> AppResult<Response> {
    let mut session = session::load_session(&cookies, &state).await;

    let authorize_url = state
        .auth_service
        .begin(&provider, &mut session.data)
        .await?;

    // The anti-forgery state must be durable before the browser leaves;
    // if the save fails we fail closed and never issue the redirect.
    state.sessions.persist(&session).await?;
    session::write_session_cookie(&cookies, &state.cookie_config, &session);

    Ok(Redirect::temporary(authorize_url.as_str()).into_response())
}

/// Handle the provider's redirect back to us.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    cookies: Cookies,
) -> AppResult<Response> {
    let mut session = session::load_session(&cookies, &state).await;
    let params: CallbackParams = query.into();

    let result = state
        .auth_service
        .callback(&provider, &params, &mut session.data)
        .await;

    match result {
        Ok(claims) => {
            state
                .sessions
                .establish(&mut session, &provider, &claims)
                .await?;
            session::write_session_cookie(&cookies, &state.cookie_config, &session);
            info!(provider = %provider, subject = %claims.subject, "login successful");
            Ok(Redirect::to("/v1/dashboard").into_response())
        }
        Err(err) => {
            // The pending state is single-use: its consumption has to be
            // persisted even though the callback failed, or the same state
            // could be replayed against a stale session record.
            if let Err(save_err) = state.sessions.persist(&session).await {
                error!(error = %save_err, "failed to persist session after callback failure");
            }
            session::write_session_cookie(&cookies, &state.cookie_config, &session);
            Err(err.into())
        }
    }
}

/// Terminate the session. Safe to call when not logged in.
pub async fn logout(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    cookies: Cookies,
) -> AppResult<Json<LogoutResponse>> {
    let mut session = session::load_session(&cookies, &state).await;

    state.sessions.terminate(&mut session).await?;
    session::remove_session_cookie(&cookies, &state.cookie_config);

    info!(provider = %provider, "logged out");
    Ok(Json(LogoutResponse {
        message: "successfully logged out".to_string(),
    }))
}

/// Names of the providers available for login, for the login page.
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.provider_names().await)
}
