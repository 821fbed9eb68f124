//! Liveness check.

use crate::http::response::ServiceResponse;

pub const HEALTHY: &str = "Service is healthy";

pub async fn check() -> ServiceResponse<()> {
    ServiceResponse::success(HEALTHY, None)
}
