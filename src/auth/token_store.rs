use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

// ============================================================================
// Token Store
// ============================================================================
//
// Keyed session store shared across instances. Token validation and
// invalidation both go through here, so revoking a session is a key delete
// rather than a process-local blacklist.
//
// ============================================================================

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `value` under `key` with a time-to-live.
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Fetch the value for `key`; None means unknown or expired.
    async fn validate(&self, key: &str) -> Result<Option<String>>;

    /// Drop `key` immediately.
    async fn invalidate(&self, key: &str) -> Result<()>;
}

pub struct RedisTokenStore {
    conn: MultiplexedConnection,
}

impl RedisTokenStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn validate(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

/// In-process store for tests and single-instance development runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: tokio::sync::Mutex<std::collections::HashMap<String, (String, std::time::Instant)>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = std::time::Instant::now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn validate(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= std::time::Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_validate() {
        let store = MemoryTokenStore::default();
        store.store("tok", "principal-json", Duration::from_secs(60)).await.unwrap();

        let value = store.validate("tok").await.unwrap();
        assert_eq!(value.as_deref(), Some("principal-json"));
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let store = MemoryTokenStore::default();
        assert!(store.validate("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_none() {
        let store = MemoryTokenStore::default();
        store.store("tok", "v", Duration::from_millis(10)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.validate("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_token() {
        let store = MemoryTokenStore::default();
        store.store("tok", "v", Duration::from_secs(60)).await.unwrap();
        store.invalidate("tok").await.unwrap();
        assert!(store.validate("tok").await.unwrap().is_none());
    }
}
