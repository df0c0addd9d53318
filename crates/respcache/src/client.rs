//! # Cache Client
//!
//! Narrow, failure-tolerant JSON key-value interface over a [`Store`].
//!
//! The cache is optional infrastructure: every operation degrades instead
//! of raising, so an outage costs latency, never correctness. Callers that
//! need to tell an outage apart from genuine absence (metrics, health
//! probes) use [`CacheClient::lookup`]; callers that only want the
//! fail-open contract use [`CacheClient::get`].

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{CacheConfig, DEFAULT_TTL};
use crate::error::Result;
use crate::store::{MemoryStore, RedisStore, Store};

/// Outcome of a cache lookup.
///
/// Distinguishes "not present" from "store unreachable or entry
/// undecodable" while keeping both on the same fail-open control path.
#[derive(Debug)]
pub enum Lookup<T> {
    /// A live entry was found and deserialized
    Hit(T),
    /// No entry under this key
    Miss,
    /// The store could not answer; treat as a miss
    Unavailable,
}

impl<T> Lookup<T> {
    /// Collapse to the original fail-to-null contract
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Unavailable => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Cheaply cloneable handle to the cache.
///
/// Explicitly constructed and passed to whoever needs it; the connection
/// state machine lives inside the store and is not exposed for mutation.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn Store>,
    default_ttl: Duration,
}

impl CacheClient {
    /// Connect to the Redis backing store described by `config`.
    ///
    /// An unreachable store is not an error; see [`RedisStore::connect`].
    pub async fn connect(config: CacheConfig) -> Result<Self> {
        let store = RedisStore::connect(&config).await?;
        Ok(Self {
            store: Arc::new(store),
            default_ttl: config.default_ttl,
        })
    }

    /// Client over a process-local in-memory store
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Client over an injected store backend
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Look up `key`, reporting the discriminated outcome.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    Lookup::Hit(value)
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "stored cache value is not valid JSON");
                    Lookup::Unavailable
                }
            },
            Ok(None) => {
                tracing::debug!(key, "cache miss");
                Lookup::Miss
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "cache lookup failed");
                Lookup::Unavailable
            }
        }
    }

    /// Look up `key`, treating any failure as a miss. Never raises.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).await.into_option()
    }

    /// Store `value` under `key`, JSON-serialized, expiring after `ttl`
    /// (the configured default when `None`). Returns `false` on any
    /// failure.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache value failed to serialize");
                return false;
            }
        };
        match self.store.set_ex(key, &json, ttl).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache write failed");
                false
            }
        }
    }

    /// Remove a single entry. Returns `false` if absent or on failure.
    pub async fn delete(&self, key: &str) -> bool {
        match self.store.del(key).await {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache delete failed");
                false
            }
        }
    }

    /// Check whether `key` holds a live entry. `false` on failure.
    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(present) => present,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache exists check failed");
                false
            }
        }
    }

    /// Remove every entry in the backing store.
    ///
    /// Destructive and store-wide (`FLUSHALL`), not scoped to any key
    /// namespace. Administrative use only.
    pub async fn flush(&self) -> bool {
        match self.store.flush_all().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "cache flush failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use async_trait::async_trait;
    use serde::Deserialize;

    /// Store whose every operation fails with a transport error.
    struct DownStore;

    #[async_trait]
    impl Store for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CacheError::Transport("connection refused".to_string()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            Err(CacheError::Transport("connection refused".to_string()))
        }

        async fn del(&self, _key: &str) -> Result<bool> {
            Err(CacheError::Transport("connection refused".to_string()))
        }

        async fn flush_all(&self) -> Result<()> {
            Err(CacheError::Transport("connection refused".to_string()))
        }

        async fn exists(&self, _key: &str) -> Result<bool> {
            Err(CacheError::Transport("connection refused".to_string()))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    fn payload() -> Payload {
        Payload {
            name: "applications".to_string(),
            count: 7,
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let client = CacheClient::in_memory();
        assert!(client.set("k", &payload(), None).await);
        assert_eq!(client.get::<Payload>("k").await, Some(payload()));
    }

    #[tokio::test]
    async fn get_returns_none_for_absent_key() {
        let client = CacheClient::in_memory();
        assert_eq!(client.get::<Payload>("absent").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_its_ttl() {
        let client = CacheClient::in_memory();
        client
            .set("k", &payload(), Some(Duration::from_secs(300)))
            .await;

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(client.get::<Payload>("k").await, None);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_key() {
        let client = CacheClient::in_memory();
        client.set("a", &1, None).await;
        client.set("b", &2, None).await;

        assert!(client.delete("a").await);
        assert_eq!(client.get::<i32>("a").await, None);
        assert_eq!(client.get::<i32>("b").await, Some(2));
    }

    #[tokio::test]
    async fn flush_clears_every_key() {
        let client = CacheClient::in_memory();
        for i in 0..4 {
            client.set(&format!("k{i}"), &i, None).await;
        }

        assert!(client.flush().await);

        for i in 0..4 {
            assert_eq!(client.get::<i32>(&format!("k{i}")).await, None);
        }
    }

    #[tokio::test]
    async fn lookup_discriminates_miss_from_outage() {
        let live = CacheClient::in_memory();
        assert!(matches!(live.lookup::<i32>("k").await, Lookup::Miss));
        live.set("k", &5, None).await;
        assert!(matches!(live.lookup::<i32>("k").await, Lookup::Hit(5)));

        let down = CacheClient::with_store(Arc::new(DownStore));
        assert!(matches!(
            down.lookup::<i32>("k").await,
            Lookup::Unavailable
        ));
    }

    #[tokio::test]
    async fn undecodable_entry_is_unavailable_not_a_hit() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_ex("k", "not json", Duration::from_secs(60))
            .await
            .unwrap();

        let client = CacheClient::with_store(store);
        assert!(matches!(
            client.lookup::<Payload>("k").await,
            Lookup::Unavailable
        ));
        assert_eq!(client.get::<Payload>("k").await, None);
    }

    #[tokio::test]
    async fn operations_degrade_when_store_is_down() {
        let client = CacheClient::with_store(Arc::new(DownStore));

        assert_eq!(client.get::<Payload>("k").await, None);
        assert!(!client.set("k", &payload(), None).await);
        assert!(!client.delete("k").await);
        assert!(!client.exists("k").await);
        assert!(!client.flush().await);
    }
}
