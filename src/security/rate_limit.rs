//! Per-IP rate limiting for guest mutations.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::http::response::ErrorBody;
use crate::http::server::AppState;
use crate::observability::metrics;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Buckets keyed by client IP. Limits come from the live config on each
/// check, so reloads apply to existing buckets.
#[derive(Default)]
pub struct RateLimiterState {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
}

impl RateLimiterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one token for `ip`. Returns `false` when the bucket is empty.
    pub fn check(&self, ip: IpAddr, config: &RateLimitConfig) -> bool {
        let burst = f64::from(config.burst_size);
        let rps = f64::from(config.requests_per_second);

        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(burst))
            .try_acquire(burst, rps)
    }

    /// Drop buckets untouched for `idle`.
    pub fn prune(&self, idle: Duration) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.last_update.elapsed() < idle);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

/// Middleware applied to reservation, contribution and RSVP routes.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.config();
    if !config.rate_limit.enabled {
        return next.run(request).await;
    }

    if state.rate_limiter.check(addr.ip(), &config.rate_limit) {
        next.run(request).await
    } else {
        tracing::warn!(client = %addr.ip(), path = %request.uri().path(), "Rate limit exceeded");
        metrics::record_rate_limited("guest_mutation");
        let body = ErrorBody {
            error: "Too many requests, try again shortly".to_string(),
            code: "rate_limited",
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        response
    }
}
