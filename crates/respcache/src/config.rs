//! # Cache Configuration
//!
//! Environment-based configuration for the cache client.

use std::env;
use std::time::Duration;

use crate::reconnect::RetryPolicy;

/// Expiration applied to `set` calls that do not specify their own TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache client configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backing store host
    pub host: String,

    /// Backing store port
    pub port: u16,

    /// Expiration for `set` calls without an explicit TTL
    pub default_ttl: Duration,

    /// Reconnection backoff policy
    pub retry: RetryPolicy,

    /// Timeout for establishing a connection
    pub connect_timeout: Duration,

    /// Per-operation response timeout, so in-flight calls fail fast
    /// instead of queueing behind a dead connection
    pub response_timeout: Duration,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `REDIS_HOST` and `REDIS_PORT`, falling back to the local
    /// endpoint `127.0.0.1:6379`.
    pub fn from_env() -> Self {
        Self {
            host: env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6379),
            ..Self::default()
        }
    }

    /// Connection URL for the backing store
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            default_ttl: DEFAULT_TTL,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(1),
            response_timeout: Duration::from_secs(1),
        }
    }
}
