//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → router.rs (route table lookup)
//!     → matcher.rs (segment-aware prefix checks)
//!     → Return: matched RouteEntry (health, images, feature, api docs)
//!
//! Route Mounting (at startup):
//!     RouteTable::standard()
//!     → handlers::mount (one axum route group per entry)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes fixed at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{RouteEntry, RouteGroup, RouteTable};
