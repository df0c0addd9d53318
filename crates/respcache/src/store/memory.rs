//! In-process store backend.
//!
//! Single-instance alternative to Redis and the hermetic test double for
//! cache semantics. Expired entries are dropped lazily on read.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;
use crate::store::Store;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now()
    }
}

/// In-memory key-value store with per-entry expiration
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired()))
    }

    async fn flush_all(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_what_was_set() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "\"v\"", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("\"v\"".to_string()));
    }

    #[tokio::test]
    async fn get_returns_none_for_absent_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "1", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();
        store.set_ex("k", "1", Duration::from_secs(60)).await.unwrap();
        store.set_ex("k", "2", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn del_removes_exactly_one_key() {
        let store = MemoryStore::new();
        store.set_ex("a", "1", Duration::from_secs(60)).await.unwrap();
        store.set_ex("b", "2", Duration::from_secs(60)).await.unwrap();

        assert!(store.del("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));

        // Deleting an absent key reports false.
        assert!(!store.del("a").await.unwrap());
    }

    #[tokio::test]
    async fn flush_clears_every_entry() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .set_ex(&format!("k{i}"), "1", Duration::from_secs(60))
                .await
                .unwrap();
        }

        store.flush_all().await.unwrap();

        for i in 0..5 {
            assert_eq!(store.get(&format!("k{i}")).await.unwrap(), None);
        }
    }
}
