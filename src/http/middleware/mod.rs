//! Pipeline stages that are not tied to a single subsystem.

pub mod error_handler;
pub mod request_logger;

pub use error_handler::{panic_response, render_failures};
pub use request_logger::log_requests;
