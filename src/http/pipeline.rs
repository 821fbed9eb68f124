//! Request pipeline assembly.
//!
//! # Data Flow
//! ```text
//! Request (x-request-id assigned or kept)
//!     → TrustProxy       (client identity from one trusted proxy hop)
//!     → Cors
//!     → SecurityHeaders  (stage default headers)
//!     → RateLimit        (429 short-circuit)
//!     → BodyParser       (400/413 short-circuit)
//!     → HeaderStrip      (drop X-Frame-Options, Content-Security-Policy)
//!     → RequestLogger    (span, completion event)
//!     → Dispatch         (route table, timeout, panic capture)
//!     → ErrorHandler     (uniform JSON failures)
//! ```
//!
//! # Design Decisions
//! - The order is fixed at assembly and never changes at runtime
//! - `Router::layer` wraps, so stages are applied in reverse: the last
//!   layer added is the first to see the request
//! - The error handler is listed last because it terminates every failed
//!   request, but it is installed outermost so failures raised by any
//!   earlier stage reach it
//! - Request ids are assigned outside the error handler, so short-circuited
//!   failures carry one and the error log can be matched to the response

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::collaborators::CollaboratorRegistry;
use crate::config::GatewayConfig;
use crate::handlers;
use crate::http::body::{parse_json_body, BodyLimits};
use crate::http::middleware::{log_requests, panic_response, render_failures};
use crate::http::request::resolve_client_identity;
use crate::routing::RouteTable;
use crate::security::{cors_layer, headers, rate_limit, HeaderPolicy, RateLimiter};

/// One step of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TrustProxy,
    Cors,
    SecurityHeaders,
    RateLimit,
    BodyParser,
    HeaderStrip,
    RequestLogger,
    Dispatch,
    ErrorHandler,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::TrustProxy => "trust-proxy",
            Stage::Cors => "cors",
            Stage::SecurityHeaders => "security-headers",
            Stage::RateLimit => "rate-limit",
            Stage::BodyParser => "body-parser",
            Stage::HeaderStrip => "header-strip",
            Stage::RequestLogger => "request-logger",
            Stage::Dispatch => "dispatch",
            Stage::ErrorHandler => "error-handler",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every request passes these stages in this order.
pub const STAGE_ORDER: [Stage; 9] = [
    Stage::TrustProxy,
    Stage::Cors,
    Stage::SecurityHeaders,
    Stage::RateLimit,
    Stage::BodyParser,
    Stage::HeaderStrip,
    Stage::RequestLogger,
    Stage::Dispatch,
    Stage::ErrorHandler,
];

/// The assembled, servable pipeline.
pub struct Pipeline {
    stages: Vec<Stage>,
    router: Router,
    rate_limiter: Arc<RateLimiter>,
}

impl Pipeline {
    /// Compose every stage around the route handlers.
    pub fn assemble(config: &GatewayConfig, registry: CollaboratorRegistry) -> Self {
        let route_table = Arc::new(RouteTable::standard());
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let policy = HeaderPolicy::from_config(&config.security);
        let limits = BodyLimits::from_config(&config.security);
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        let mut router = handlers::mount(&route_table, Arc::new(registry), &config.static_assets);

        for stage in STAGE_ORDER.iter().rev() {
            router = match stage {
                Stage::ErrorHandler => router,
                Stage::Dispatch => router
                    .layer(CatchPanicLayer::custom(panic_response))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        request_timeout,
                    )),
                Stage::RequestLogger => router
                    .layer(middleware::from_fn_with_state(route_table.clone(), log_requests)),
                Stage::HeaderStrip => router.layer(middleware::from_fn_with_state(
                    policy.clone(),
                    headers::strip_headers,
                )),
                Stage::BodyParser => {
                    router.layer(middleware::from_fn_with_state(limits, parse_json_body))
                }
                Stage::RateLimit => router.layer(middleware::from_fn_with_state(
                    rate_limiter.clone(),
                    rate_limit::enforce,
                )),
                Stage::SecurityHeaders => router.layer(middleware::from_fn_with_state(
                    policy.clone(),
                    headers::apply_security_headers,
                )),
                Stage::Cors => router.layer(cors_layer(&config.cors)),
                Stage::TrustProxy => router.layer(middleware::from_fn(resolve_client_identity)),
            };
        }

        let router = router
            .layer(middleware::from_fn(render_failures))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        tracing::debug!(
            stages = %STAGE_ORDER.map(|s| s.name()).join(" → "),
            "Pipeline assembled"
        );

        Self {
            stages: STAGE_ORDER.to_vec(),
            router,
            rate_limiter,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Shared limiter state, for the janitor task and inspection.
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        self.rate_limiter.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}
