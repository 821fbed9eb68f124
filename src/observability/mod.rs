//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages and handlers produce:
//!     → logging.rs (structured log events, one span per request)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for production)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request id and client identity are recorded on the request span, so
//!   every event emitted while handling a request carries them
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
