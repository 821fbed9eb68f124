//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (client identity already resolved):
//!     → cors.rs (answer preflights, tag cross-origin responses)
//!     → headers.rs (stage default security headers)
//!     → rate_limit.rs (count per client, reject over the limit)
//!     → [body parser]
//!     → headers.rs (strip X-Frame-Options and Content-Security-Policy)
//!     → Pass to logging and dispatch
//! ```
//!
//! # Design Decisions
//! - Rejections are raised as `GatewayError` and rendered by the error
//!   handler like any other failure
//! - The limiter is process-wide state shared through an `Arc`

pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use cors::cors_layer;
pub use headers::{HeaderPolicy, PendingHeaders};
pub use rate_limit::{RateDecision, RateLimiter};
