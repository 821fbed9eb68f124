//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, connect info, graceful shutdown)
//!     → pipeline.rs (fixed stage order around the route handlers)
//!         request.rs  (client identity, request id)
//!         body.rs     (JSON body parsing and payload extraction)
//!         middleware/ (request logging, error rendering)
//!     → response.rs (success envelope)
//!     → Send to client
//! ```

pub mod body;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::{Pipeline, Stage, STAGE_ORDER};
pub use request::{ClientIdentity, X_REQUEST_ID};
pub use response::ServiceResponse;
pub use server::GatewayServer;
