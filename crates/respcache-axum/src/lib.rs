//! # respcache-axum
//!
//! Response-cache middleware for axum/tower services.
//!
//! Memoizes successful GET JSON responses in a [`respcache::CacheClient`],
//! keyed by the request's full path and query string.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use axum::{routing::get, Router};
//! use respcache::{CacheClient, CacheConfig};
//! use respcache_axum::ResponseCacheLayer;
//!
//! let client = CacheClient::connect(CacheConfig::from_env()).await?;
//!
//! let app: Router = Router::new()
//!     .route("/api/applications", get(list_applications))
//!     .layer(ResponseCacheLayer::new(client).ttl(Duration::from_secs(60)));
//! ```
//!
//! ## Consistency trade-off
//!
//! Cached entries are never invalidated when the underlying data changes;
//! staleness is bounded only by the TTL. Readers may observe responses up
//! to one TTL old after a mutation. Keep the TTL short for data where that
//! matters, or leave such routes out of the layer entirely.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod key;
pub mod layer;

pub use key::{cache_key, KEY_NAMESPACE};
pub use layer::{
    ResponseCache, ResponseCacheLayer, CACHE_STATUS_HEADER, DEFAULT_RESPONSE_TTL,
};

// Re-export the client types for convenience
pub use respcache::{CacheClient, CacheConfig, Lookup};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
