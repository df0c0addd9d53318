//! # Redis Store Backend
//!
//! Redis-backed store with an owned reconnection state machine.
//!
//! The connection lifecycle is `Connecting -> Connected -> (Retrying ->
//! Connected | Failed)`. Losing the connection never blocks an in-flight
//! operation: callers get an immediate transport error while a single
//! background task retries with bounded backoff. Once the retry budget is
//! exhausted the state is terminal and every subsequent operation fails
//! fast until a new store is constructed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::reconnect::{Backoff, ConnectionState, RetryPolicy};
use crate::store::Store;

enum State {
    Connecting,
    Connected(MultiplexedConnection),
    Retrying { attempt: u32 },
    Failed,
}

struct Inner {
    client: Client,
    policy: RetryPolicy,
    connect_timeout: Duration,
    response_timeout: Duration,
    state: RwLock<State>,
}

/// Remote key-value store over Redis
pub struct RedisStore {
    inner: Arc<Inner>,
}

impl RedisStore {
    /// Connect to the store described by `config`.
    ///
    /// Only a malformed endpoint is an error. An unreachable store is not:
    /// the client comes up degraded and the reconnection machine takes
    /// over, so a cache outage never prevents the service from starting.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = Client::open(config.url())?;
        let inner = Arc::new(Inner {
            client,
            policy: config.retry,
            connect_timeout: config.connect_timeout,
            response_timeout: config.response_timeout,
            state: RwLock::new(State::Connecting),
        });

        match inner.connect_once().await {
            Ok(conn) => {
                *inner.state.write().await = State::Connected(conn);
                tracing::info!(url = %config.url(), "cache connected");
            }
            Err(err) => {
                tracing::warn!(url = %config.url(), error = %err, "cache unreachable; retrying in background");
                Inner::begin_retry(&inner).await;
            }
        }

        Ok(Self { inner })
    }

    /// Current connection lifecycle state
    pub async fn state(&self) -> ConnectionState {
        match &*self.inner.state.read().await {
            State::Connecting => ConnectionState::Connecting,
            State::Connected(_) => ConnectionState::Connected,
            State::Retrying { attempt } => ConnectionState::Retrying { attempt: *attempt },
            State::Failed => ConnectionState::Failed,
        }
    }
}

impl Inner {
    async fn connect_once(&self) -> RedisResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection_with_timeouts(
                self.response_timeout,
                self.connect_timeout,
            )
            .await
    }

    /// Hand out a connection for one operation, or fail fast.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        match &*self.state.read().await {
            State::Connected(conn) => Ok(conn.clone()),
            State::Connecting | State::Retrying { .. } => Err(CacheError::Transport(
                "cache connection not established".to_string(),
            )),
            State::Failed => Err(CacheError::Exhausted),
        }
    }

    /// Record an operation failure, kicking off reconnection if it was a
    /// connection-level error, and convert it for the caller.
    async fn note_error(inner: &Arc<Self>, err: RedisError) -> CacheError {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            Self::begin_retry(inner).await;
        }
        err.into()
    }

    /// Transition to `Retrying` and spawn the single reconnect task.
    /// No-op when a cycle is already running or the state is terminal.
    async fn begin_retry(inner: &Arc<Self>) {
        let mut state = inner.state.write().await;
        if matches!(*state, State::Retrying { .. } | State::Failed) {
            return;
        }
        *state = State::Retrying { attempt: 0 };
        drop(state);

        tokio::spawn(reconnect_loop(Arc::clone(inner)));
    }
}

async fn reconnect_loop(inner: Arc<Inner>) {
    let mut backoff = Backoff::new(inner.policy);
    loop {
        let Some(delay) = backoff.next_delay() else {
            *inner.state.write().await = State::Failed;
            tracing::error!(
                attempts = inner.policy.max_attempts,
                "cache reconnection budget exhausted; connection is permanently failed"
            );
            return;
        };

        *inner.state.write().await = State::Retrying {
            attempt: backoff.attempt(),
        };
        tracing::warn!(
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            "retrying cache connection"
        );
        tokio::time::sleep(delay).await;

        match inner.connect_once().await {
            Ok(conn) => {
                *inner.state.write().await = State::Connected(conn);
                tracing::info!("cache connection re-established");
                return;
            }
            Err(err) => {
                tracing::warn!(attempt = backoff.attempt(), error = %err, "cache reconnect attempt failed");
            }
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.inner.connection().await?;
        let result: RedisResult<Option<String>> = conn.get(key).await;
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(Inner::note_error(&self.inner, err).await),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.inner.connection().await?;
        let result: RedisResult<()> = conn.set_ex(key, value, ttl.as_secs()).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(Inner::note_error(&self.inner, err).await),
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.inner.connection().await?;
        let result: RedisResult<i64> = conn.del(key).await;
        match result {
            Ok(removed) => Ok(removed > 0),
            Err(err) => Err(Inner::note_error(&self.inner, err).await),
        }
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.inner.connection().await?;
        let result: RedisResult<()> = redis::cmd("FLUSHALL").query_async(&mut conn).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(Inner::note_error(&self.inner, err).await),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.inner.connection().await?;
        let result: RedisResult<bool> = conn.exists(key).await;
        match result {
            Ok(present) => Ok(present),
            Err(err) => Err(Inner::note_error(&self.inner, err).await),
        }
    }
}
