use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SESSION_ID_LEN: usize = 32;

/// Opaque per-browser session identifier, transported via a signed cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(SESSION_ID_LEN))
    }

    #[must_use]
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An in-flight authorization attempt, bound to one session.
///
/// State and nonce are single-use: the callback consumes them whether or
/// not it succeeds. Starting a new attempt overwrites any previous one, so
/// at most one attempt per session is ever valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuth {
    pub provider: String,
    pub state: String,
    pub nonce: String,
    pub created_at: DateTime<Utc>,
}

/// Typed session payload.
///
/// Only `SessionService::establish` may flip `authenticated` to true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub authenticated: bool,
    pub subject: Option<String>,
    pub provider: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub pending_auth: Option<PendingAuth>,
}

/// A session record: identifier plus payload. Storage and transport are
/// owned by the session store and the HTTP layer respectively.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub data: SessionData,
}

impl Session {
    /// Fresh anonymous session with a newly generated id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            data: SessionData::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_session_data_roundtrips_through_json() {
        let data = SessionData {
            authenticated: true,
            subject: Some("user-123".to_string()),
            provider: Some("test".to_string()),
            email: Some("u@example.com".to_string()),
            name: None,
            pending_auth: None,
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: SessionData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let back: SessionData = serde_json::from_str("{}").unwrap();
        assert!(!back.authenticated);
        assert!(back.pending_auth.is_none());
    }
}
