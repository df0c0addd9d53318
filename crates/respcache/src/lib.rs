//! # respcache
//!
//! Failure-tolerant JSON key-value cache client over a remote backing
//! store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CacheClient                            │
//! │   (JSON serialization, TTLs, fail-open degradation)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Store trait                            │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │      RedisStore         │   │        MemoryStore           │
//! │ (bounded reconnection)  │   │     (process-local)          │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The cache is a performance layer, not a consistency-bearing store:
//! every client operation degrades to a miss or a no-op on failure, so an
//! unavailable cache costs latency, never correctness or availability.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use respcache::{CacheClient, CacheConfig};
//!
//! let client = CacheClient::connect(CacheConfig::from_env()).await?;
//!
//! client.set("user:42", &user, None).await;
//! let user: Option<User> = client.get("user:42").await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod reconnect;
pub mod store;

// Re-export commonly used types
pub use client::{CacheClient, Lookup};
pub use config::{CacheConfig, DEFAULT_TTL};
pub use error::{CacheError, Result};
pub use reconnect::{ConnectionState, RetryPolicy};
pub use store::{MemoryStore, RedisStore, Store};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
