//! Session establishment and termination.
//!
//! The only code path allowed to mark a session authenticated lives here;
//! the auth flow hands verified claims over and everything else just reads
//! the session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::models::{IdentityClaims, Session, SessionData, SessionId};
use crate::session::SessionStore;
use crate::Result;

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Load the session for a transported id, or start a fresh anonymous
    /// one. A valid cookie whose backing record is gone gets a new id, so
    /// a stale id can never be re-adopted.
    pub async fn load_or_create(&self, id: Option<SessionId>) -> Session {
        if let Some(id) = id {
            match self.store.load(&id).await {
                Ok(Some(data)) => return Session { id, data },
                Ok(None) => debug!(session = %id, "session record missing or expired"),
                Err(e) => debug!(session = %id, error = %e, "session load failed"),
            }
        }
        Session::new()
    }

    /// Persist the session as-is. Used by the flow handlers to make the
    /// pending state durable before the browser is redirected away.
    pub async fn persist(&self, session: &Session) -> Result<()> {
        self.store.save(&session.id, &session.data, self.ttl).await
    }

    /// Mark the session authenticated with the verified identity and
    /// persist it.
    pub async fn establish(
        &self,
        session: &mut Session,
        provider: &str,
        claims: &IdentityClaims,
    ) -> Result<()> {
        session.data.authenticated = true;
        session.data.subject = Some(claims.subject.clone());
        session.data.provider = Some(provider.to_string());
        session.data.email = claims.email.clone();
        session.data.name = claims.name.clone();
        self.persist(session).await?;

        info!(provider, subject = %claims.subject, "session established");
        Ok(())
    }

    /// Clear all authentication fields and drop the backing record.
    /// Terminating an already-anonymous session is a no-op success.
    pub async fn terminate(&self, session: &mut Session) -> Result<()> {
        session.data = SessionData::default();
        self.store.delete(&session.id).await?;
        debug!(session = %session.id, "session terminated");
        Ok(())
    }
}
