//! # Response Cache Middleware
//!
//! Tower layer that memoizes successful GET JSON responses by request
//! identity.
//!
//! On a hit the cached payload is served directly and the downstream
//! handler never runs. On a miss the downstream response is captured at
//! the moment it is produced, forwarded to the caller unchanged, and
//! stored in the background. A cache outage is invisible to HTTP callers:
//! lookups fail open into the downstream handler.
//!
//! Entries are never invalidated by writes elsewhere; staleness is bounded
//! only by the TTL, so readers may observe data up to one TTL old after an
//! underlying mutation.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use respcache::{CacheClient, Lookup};
use tower::{Layer, Service};

use crate::key::cache_key;

/// How long a cached response remains valid unless overridden
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(300);

/// Reports whether a response was served from the cache
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Layer applying [`ResponseCache`] to a service.
#[derive(Clone)]
pub struct ResponseCacheLayer {
    client: CacheClient,
    ttl: Duration,
}

impl ResponseCacheLayer {
    /// Cache responses through `client` with the default TTL.
    pub fn new(client: CacheClient) -> Self {
        Self {
            client,
            ttl: DEFAULT_RESPONSE_TTL,
        }
    }

    /// Override how long cached responses remain valid.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl<S> Layer<S> for ResponseCacheLayer {
    type Service = ResponseCache<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCache {
            inner,
            client: self.client.clone(),
            ttl: self.ttl,
        }
    }
}

/// Middleware service produced by [`ResponseCacheLayer`].
#[derive(Clone)]
pub struct ResponseCache<S> {
    inner: S,
    client: CacheClient,
    ttl: Duration,
}

impl<S> Service<Request> for ResponseCache<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Only the safe read path participates; everything else passes
        // through untouched. Keys are method-invariant, so caching a
        // bodyless HEAD response would poison the GET entry for the same
        // path and query.
        if req.method() != Method::GET {
            return Box::pin(self.inner.call(req));
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let client = self.client.clone();
        let ttl = self.ttl;

        Box::pin(async move {
            let key = cache_key(req.uri());

            if let Lookup::Hit(payload) = client.lookup::<serde_json::Value>(&key).await {
                return Ok(hit_response(&payload));
            }

            // Miss, or the store could not answer: fail open downstream.
            let response = inner.call(req).await?;
            Ok(capture_and_store(response, client, key, ttl).await)
        })
    }
}

/// Serve a cached payload without invoking the downstream handler.
fn hit_response(payload: &serde_json::Value) -> Response {
    let mut response = Response::new(Body::from(payload.to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("HIT"));
    response
}

fn is_cacheable(response: &Response) -> bool {
    response.status().is_success()
        && response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"))
}

/// Forward the downstream response, storing its body in the background
/// when it is a successful JSON payload.
async fn capture_and_store(
    response: Response,
    client: CacheClient,
    key: String,
    ttl: Duration,
) -> Response {
    if !is_cacheable(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            // The downstream body stream itself failed; the response was
            // already lost, cached or not.
            tracing::warn!(key = %key, error = %err, "failed to read downstream response body");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return response;
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(payload) => {
            // Fire-and-forget: the task outlives the request, so an
            // aborted caller cannot cancel the write midway, and a failed
            // write cannot affect the response already on the wire.
            tokio::spawn(async move {
                if !client.set(&key, &payload, Some(ttl)).await {
                    tracing::warn!(key = %key, "failed to populate response cache");
                }
            });
        }
        Err(err) => {
            tracing::debug!(key = %key, error = %err, "response body is not JSON; not caching");
        }
    }

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}
