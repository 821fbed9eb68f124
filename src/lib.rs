//! Office Gateway Library
//!
//! HTTP front door for the office and content feature services: every
//! request runs through a fixed pipeline of policy stages before it is
//! dispatched to a route handler.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use collaborators::{Collaborator, CollaboratorRegistry, Feature};
pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::{GatewayServer, Pipeline};
pub use lifecycle::Shutdown;
