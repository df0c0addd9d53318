//! # Store Backends
//!
//! Abstract interface over the backing key-value store. Implementations can
//! be swapped for different backends (Redis, in-memory, mock).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Wire-level key-value operations. Values are UTF-8 JSON text.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` with the given expiration. Last write wins.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a single entry; `true` if the key was present
    async fn del(&self, key: &str) -> Result<bool>;

    /// Remove every entry in the store, not just this layer's namespace
    async fn flush_all(&self) -> Result<()>;

    /// Check whether `key` holds a live entry
    async fn exists(&self, key: &str) -> Result<bool>;
}
