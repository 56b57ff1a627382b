use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager as RedisConnectionManager;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{SessionData, SessionId};
use crate::Result;

/// Persistence for per-browser session records, keyed by session id.
///
/// Implementations own expiry: a `load` after the save's TTL has elapsed
/// returns `None`. Deleting an absent record is a success.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>>;
    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> Result<()>;
    async fn delete(&self, id: &SessionId) -> Result<()>;
}

// ============================================================================
// In-process store
// ============================================================================

struct StoredEntry {
    data: SessionData,
    expires_at: Instant,
}

/// In-process session store. Sessions die with the process; fine for
/// development and single-instance deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries. Expiry is otherwise enforced lazily on load,
    /// so long-running processes can call this periodically to bound
    /// memory.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        removed
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>> {
        {
            let entries = self.entries.read().await;
            match entries.get(id.as_str()) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.data.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // entry exists but is expired; evict it
        self.entries.write().await.remove(id.as_str());
        Ok(None)
    }

    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            id.as_str().to_string(),
            StoredEntry {
                data: data.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        self.entries.write().await.remove(id.as_str());
        Ok(())
    }
}

// ============================================================================
// Redis-backed store
// ============================================================================

/// Redis-backed session store for multi-replica deployments. Records are
/// JSON values under `{prefix}{session-id}` with a redis-side TTL, so
/// expiry needs no sweeper.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: RedisConnectionManager,
    key_prefix: String,
}

impl RedisSessionStore {
    pub async fn connect(url: &str, key_prefix: String) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let redis = RedisConnectionManager::new(client).await?;
        Ok(Self { redis, key_prefix })
    }

    fn key(&self, id: &SessionId) -> String {
        format!("{}{}", self.key_prefix, id.as_str())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(id))
            .query_async(&mut conn)
            .await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &SessionId, data: &SessionData, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let mut conn = self.redis.clone();
        let _: () = redis::cmd("SET")
            .arg(self.key(id))
            .arg(json)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = redis::cmd("DEL")
            .arg(self.key(id))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
