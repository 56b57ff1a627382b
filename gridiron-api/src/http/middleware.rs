// HTTP middleware

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use gridiron_core::models::Session;

use super::{session, AppState};

/// The request's resolved session, stashed for handlers behind
/// [`require_authenticated`].
#[derive(Clone)]
pub struct CurrentSession(pub Arc<Session>);

/// Gate for the authenticated area: anonymous browsers are sent back to
/// the login page.
pub async fn require_authenticated(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let session = session::load_session(&cookies, &state).await;

    if !session.data.authenticated {
        return Redirect::to("/").into_response();
    }

    request
        .extensions_mut()
        .insert(CurrentSession(Arc::new(session)));
    next.run(request).await
}
