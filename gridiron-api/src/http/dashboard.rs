// Dashboard handler: the landing spot after a successful login. League
// and team data comes from the data-access layer, which is outside this
// service; here we surface the authenticated identity.

use axum::{response::IntoResponse, Extension, Json};
use serde::Serialize;
use serde_json::json;

use super::middleware::CurrentSession;

#[derive(Debug, Serialize)]
struct DashboardUser {
    subject: Option<String>,
    provider: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

pub async fn show(Extension(CurrentSession(session)): Extension<CurrentSession>) -> impl IntoResponse {
    let user = DashboardUser {
        subject: session.data.subject.clone(),
        provider: session.data.provider.clone(),
        email: session.data.email.clone(),
        name: session.data.name.clone(),
    };
    Json(json!({ "user": user }))
}
