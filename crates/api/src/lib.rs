//! HTTP API layer for folio.
//!
//! - **Endpoints**: JSON `POST` routes for posts, comments and reactions
//! - **Extractors**: Bearer-token profile resolution
//! - **Middleware**: Authentication and sliding-window rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
