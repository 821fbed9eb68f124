//! Fixed-window rate limiting per client identity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::error::GatewayError;
use crate::http::request::client_identity;
use crate::observability::metrics;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Hits recorded for one client in the current window.
#[derive(Debug)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Whole seconds until reset, rounded up.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 { secs + 1 } else { secs }
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        let limit = HeaderValue::from(self.limit);
        let remaining = HeaderValue::from(self.remaining);
        headers.insert(RATELIMIT_LIMIT.clone(), limit.clone());
        headers.insert(RATELIMIT_REMAINING.clone(), remaining.clone());
        headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(self.reset_secs()));
        headers.insert(X_RATELIMIT_LIMIT.clone(), limit);
        headers.insert(X_RATELIMIT_REMAINING.clone(), remaining);
    }
}

/// Process-wide limiter state.
///
/// Windows are created lazily on a client's first request and reset once
/// they expire. Counting happens under the map entry's lock, so concurrent
/// requests from one client never lose an increment.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    enabled: bool,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count a request from `client` now.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Count a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert_with(|| Window { started: now, hits: 0 });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.started) >= self.window {
            window.started = now;
            window.hits = 0;
        }

        window.hits = window.hits.saturating_add(1);

        RateDecision {
            allowed: window.hits <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.hits),
            reset_after: self
                .window
                .saturating_sub(now.saturating_duration_since(window.started)),
        }
    }

    /// Hits recorded for `client` in its current window.
    pub fn hits(&self, client: &str) -> u32 {
        self.windows.get(client).map(|w| w.hits).unwrap_or(0)
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows that expired before `now`. Returns how many were dropped.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Periodically purge expired windows until shutdown.
    pub async fn run_janitor(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            return;
        }

        let period = self.window.min(Duration::from_secs(60)).max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired(Instant::now());
                    if purged > 0 {
                        tracing::debug!(purged, tracked = self.tracked_clients(), "Purged expired rate-limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit janitor stopping");
                    break;
                }
            }
        }
    }
}

/// Rate limiting stage.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = client_identity(&request);
    let decision = limiter.check(client.as_str());

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, limit = decision.limit, "Rate limit exceeded");
        metrics::record_rate_limited();
        GatewayError::RateLimited { retry_after: decision.reset_secs() }.into_response()
    };

    decision.write_headers(response.headers_mut());
    response
}
