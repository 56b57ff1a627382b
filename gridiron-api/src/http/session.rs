// Session cookie plumbing: the cookie carries a signed session id, the
// record itself stays server-side.

use gridiron_core::models::Session;
use gridiron_core::session::CookieSigner;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use super::AppState;

/// Cookie attributes plus the signer, shared by all handlers.
#[derive(Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub signer: CookieSigner,
    /// Set the `Secure` attribute; off only in development.
    pub secure: bool,
}

/// Resolve the request's session: verify the cookie signature and load the
/// backing record, or start a fresh anonymous session.
pub async fn load_session(cookies: &Cookies, state: &AppState) -> Session {
    let id = cookies
        .get(&state.cookie_config.name)
        .and_then(|cookie| state.cookie_config.signer.verify(cookie.value()));
    state.sessions.load_or_create(id).await
}

/// (Re)issue the session cookie for this response.
pub fn write_session_cookie(cookies: &Cookies, config: &SessionCookieConfig, session: &Session) {
    let cookie = Cookie::build((config.name.clone(), config.signer.sign(&session.id)))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);
}

/// Removal cookie with the same attributes as the login cookie, so the
/// browser actually drops it.
pub fn remove_session_cookie(cookies: &Cookies, config: &SessionCookieConfig) {
    let cookie = Cookie::build((config.name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .build();
    cookies.add(cookie);
}
