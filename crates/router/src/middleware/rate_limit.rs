//! Fixed window rate limiting.
//!
//! The limiter only decides; counting is delegated to a [`CounterStore`] so the
//! counters can live in process ([`MemoryCounterStore`]) or in a shared backend.

use crate::error::HandlerError;
use crate::handler::{Flow, HandlerResult, RequestHandler};
use crate::request::RequestContext;
use crate::responder::Responder;
use async_trait::async_trait;
use http::header::RETRY_AFTER;
use http::{HeaderName, HeaderValue, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

const DEFAULT_KEY_HEADER: &str = "x-forwarded-for";
const ANONYMOUS_KEY: &str = "anonymous";

/// The state of one key's counter after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// Hits counted in the current window, this one included
    pub hits: u64,
    /// Time left until the current window ends
    pub reset_after: Duration,
}

/// Per key hit counters.
///
/// Implementations are shared by every request in flight and must be safe to
/// call concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Hits counted for `key` in the current window
    async fn get(&self, key: &str) -> Result<u64, HandlerError>;

    /// Counts one hit for `key`, opening a new window if the previous one ended.
    async fn increment(&self, key: &str) -> Result<Counter, HandlerError>;

    /// Forgets everything counted for `key`
    async fn reset(&self, key: &str) -> Result<(), HandlerError>;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    hits: u64,
    started: Instant,
}

#[derive(Debug)]
struct Counters {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// An in process [`CounterStore`] with fixed windows.
///
/// Expired windows are evicted at most once per window length, on increment, so
/// keys that stop sending requests do not stay in memory.
#[derive(Debug)]
pub struct MemoryCounterStore {
    window: Duration,
    counters: Mutex<Counters>,
}

impl MemoryCounterStore {
    pub fn new(window: Duration) -> Self {
        let counters = Counters { windows: HashMap::new(), last_sweep: Instant::now() };
        Self { window, counters: Mutex::new(counters) }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of keys currently held in memory
    pub async fn tracked_keys(&self) -> usize {
        self.counters.lock().await.windows.len()
    }

    fn is_expired(&self, window: &Window, now: Instant) -> bool {
        now.duration_since(window.started) >= self.window
    }

    fn sweep(&self, counters: &mut Counters, now: Instant) {
        if now.duration_since(counters.last_sweep) < self.window {
            return;
        }
        let before = counters.windows.len();
        counters.windows.retain(|_, window| !self.is_expired(window, now));
        counters.last_sweep = now;
        debug!(evicted = before - counters.windows.len(), "expired rate limit windows evicted");
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<u64, HandlerError> {
        let now = Instant::now();
        let counters = self.counters.lock().await;
        Ok(counters.windows.get(key).filter(|window| !self.is_expired(window, now)).map_or(0, |window| window.hits))
    }

    async fn increment(&self, key: &str) -> Result<Counter, HandlerError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        self.sweep(&mut counters, now);

        let window = counters.windows.entry(key.to_string()).or_insert(Window { hits: 0, started: now });
        if self.is_expired(window, now) {
            *window = Window { hits: 0, started: now };
        }
        window.hits += 1;

        Ok(Counter { hits: window.hits, reset_after: self.window.saturating_sub(now.duration_since(window.started)) })
    }

    async fn reset(&self, key: &str) -> Result<(), HandlerError> {
        self.counters.lock().await.windows.remove(key);
        Ok(())
    }
}

/// Rejects clients that sent more than `limit` requests in the current window.
///
/// Clients are told apart by a request header, `x-forwarded-for` unless
/// configured otherwise; requests without it share the `anonymous` counter.
/// Rejected requests get a 429 response with a `retry-after` header.
#[derive(Debug)]
pub struct RateLimit<S> {
    store: S,
    limit: u64,
    key_header: HeaderName,
}

impl<S: CounterStore> RateLimit<S> {
    pub fn new(store: S, limit: u64) -> Self {
        Self { store, limit, key_header: HeaderName::from_static(DEFAULT_KEY_HEADER) }
    }

    /// Uses `header` to identify the client.
    pub fn key_header(mut self, header: HeaderName) -> Self {
        self.key_header = header;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn client_key<'r>(&self, req: &'r RequestContext) -> &'r str {
        req.headers()
            .get(&self.key_header)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .unwrap_or(ANONYMOUS_KEY)
    }
}

#[async_trait]
impl<S, E, C> RequestHandler<E, C> for RateLimit<S>
where
    S: CounterStore,
    E: Sync,
    C: Sync,
{
    async fn invoke(&self, req: &mut RequestContext, _env: &E, _ctx: &C) -> HandlerResult {
        let key = self.client_key(req);
        let counter = self.store.increment(key).await?;
        if counter.hits <= self.limit {
            return Ok(Flow::Continue);
        }

        warn!(key, hits = counter.hits, limit = self.limit, "rate limit exceeded");
        let mut response = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
        response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(counter.reset_after)));
        Ok(Flow::Respond(response))
    }
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(reset_after: Duration) -> u64 {
    let secs = reset_after.as_secs() + u64::from(reset_after.subsec_nanos() > 0);
    secs.max(1)
}
