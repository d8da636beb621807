//! API rate limiting middleware.
//!
//! Sliding-window log limiter keyed by profile ID or client IP. Every
//! allowed request records its instant; a request is admitted while fewer
//! than `max_requests` instants fall inside the trailing window.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use folio_common::config::RateLimitSettings;
use folio_db::entities::profile;
use tokio::sync::RwLock;

/// Rate limit configuration for one class of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit config.
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Default rate limits for the endpoint classes.
pub mod limits {
    use super::RateLimitConfig;

    /// Reads: feeds, single posts, threads, reaction lists.
    pub const READ: RateLimitConfig = RateLimitConfig::new(300, 60);

    /// Writes: create, update, delete, toggle.
    pub const WRITE: RateLimitConfig = RateLimitConfig::new(30, 60);
}

/// API rate limiter.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    /// Admitted request instants per key, oldest first.
    logs: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.check_at(key, config, Instant::now()).await
    }

    async fn check_at(&self, key: &str, config: &RateLimitConfig, now: Instant) -> RateLimitResult {
        let mut logs = self.logs.write().await;
        let window = config.window();
        let log = logs.entry(key.to_string()).or_default();

        while log
            .front()
            .is_some_and(|&at| now.saturating_duration_since(at) >= window)
        {
            log.pop_front();
        }

        // Time until the oldest request in the window slides out.
        let until_free = |log: &VecDeque<Instant>| {
            log.front().map_or(Duration::ZERO, |&oldest| {
                window.saturating_sub(now.saturating_duration_since(oldest))
            })
        };

        if log.len() >= config.max_requests as usize {
            return RateLimitResult::Limited {
                retry_after: ceil_secs(until_free(log)).max(1),
                remaining: 0,
                limit: config.max_requests,
            };
        }

        log.push_back(now);
        let used = u32::try_from(log.len()).unwrap_or(u32::MAX);

        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(used),
            limit: config.max_requests,
            reset: ceil_secs(until_free(log)),
        }
    }

    /// Drop keys with no request inside `max_window_secs`.
    pub async fn cleanup(&self, max_window_secs: u64) {
        self.cleanup_at(max_window_secs, Instant::now()).await;
    }

    async fn cleanup_at(&self, max_window_secs: u64, now: Instant) {
        let mut logs = self.logs.write().await;
        let max_window = Duration::from_secs(max_window_secs);

        logs.retain(|_, log| {
            log.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < max_window)
        });
    }

    /// Get the number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Rate limit check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed {
        /// Remaining requests in window.
        remaining: u32,
        /// Total limit.
        limit: u32,
        /// Seconds until the oldest counted request leaves the window.
        reset: u64,
    },
    /// Request is rate limited.
    Limited {
        /// Seconds until a request would be admitted again.
        retry_after: u64,
        /// Remaining requests (0).
        remaining: u32,
        /// Total limit.
        limit: u32,
    },
}

/// Rate limiter state for middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    /// Per-profile rate limiter.
    pub user_limiter: ApiRateLimiter,
    /// Per-IP rate limiter (for unauthenticated requests).
    pub ip_limiter: ApiRateLimiter,
    pub read: RateLimitConfig,
    pub write: RateLimitConfig,
    pub enabled: bool,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterState {
    /// Create a limiter with the built-in limits.
    pub fn new() -> Self {
        Self {
            user_limiter: ApiRateLimiter::new(),
            ip_limiter: ApiRateLimiter::new(),
            read: limits::READ,
            write: limits::WRITE,
            enabled: true,
        }
    }

    /// Create a limiter from the `rate_limit` configuration section.
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            read: RateLimitConfig::new(settings.max_requests, settings.window_secs),
            write: RateLimitConfig::new(settings.max_writes, settings.window_secs),
            enabled: settings.enabled,
            ..Self::new()
        }
    }

    /// Forget clients idle for longer than the window.
    pub async fn cleanup(&self) {
        let window = self.read.window_secs.max(self.write.window_secs);
        self.user_limiter.cleanup(window).await;
        self.ip_limiter.cleanup(window).await;
    }
}

/// Rate limit error response.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests",
                "retryAfter": self.retry_after
            }
        });

        (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("Retry-After", self.retry_after.to_string()),
                ("Content-Type", "application/json".to_string()),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

/// Extract client IP from request.
fn extract_client_ip(req: &Request<Body>) -> Option<IpAddr> {
    if let Some(xff) = req.headers().get("x-forwarded-for")
        && let Ok(xff_str) = xff.to_str()
        && let Some(first_ip) = xff_str.split(',').next()
        && let Ok(ip) = first_ip.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Whether the request mutates content.
fn is_write(req: &Request<Body>) -> bool {
    matches!(
        req.uri().path().rsplit('/').next(),
        Some("create" | "update" | "delete" | "toggle")
    )
}

/// Rate limiting middleware.
///
/// Run inside the auth middleware so authenticated requests are keyed by
/// profile rather than address.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !limiter.enabled {
        return Ok(next.run(req).await);
    }

    let (class, config) = if is_write(&req) {
        ("write", limiter.write)
    } else {
        ("read", limiter.read)
    };

    let result = if let Some(user) = req.extensions().get::<profile::Model>() {
        let key = format!("{class}:user:{}", user.id);
        limiter.user_limiter.check(&key, &config).await
    } else {
        let key = extract_client_ip(&req)
            .map_or_else(|| format!("{class}:unknown"), |ip| format!("{class}:ip:{ip}"));
        limiter.ip_limiter.check(&key, &config).await
    };

    match result {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            Ok(response)
        }
        RateLimitResult::Limited { retry_after, .. } => {
            tracing::debug!(class = class, retry_after = retry_after, "Rate limited request");
            Err(RateLimitError { retry_after })
        }
    }
}
