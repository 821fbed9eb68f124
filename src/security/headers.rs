//! Security response headers.
//!
//! # Responsibilities
//! - Stage the default security headers for every request
//! - Strip `X-Frame-Options` and `Content-Security-Policy` afterwards
//!
//! # Design Decisions
//! - Two phases: defaults are applied first, removals second. The pair is
//!   set and then removed, never simply left out, so anything that inspects
//!   [`PendingHeaders`] between the two stages sees the full default set
//! - Headers are staged during the request phase in a shared map and merged
//!   into the response on the way out; values set by handlers win
//! - Removal is enforced on every response, including short-circuited
//!   failures from stages that run before the strip stage

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Headers removed from every response.
pub const STRIPPED_HEADERS: [HeaderName; 2] =
    [header::X_FRAME_OPTIONS, header::CONTENT_SECURITY_POLICY];

/// Defaults to stage and headers to remove.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    defaults: Arc<HeaderMap>,
    removals: Arc<[HeaderName]>,
}

impl HeaderPolicy {
    pub fn standard() -> Self {
        let mut defaults = HeaderMap::with_capacity(DEFAULT_HEADERS.len());
        for &(name, value) in DEFAULT_HEADERS {
            defaults.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        Self {
            defaults: Arc::new(defaults),
            removals: Arc::from(STRIPPED_HEADERS.as_slice()),
        }
    }

    /// No defaults, removals still enforced.
    pub fn removals_only() -> Self {
        Self {
            defaults: Arc::new(HeaderMap::new()),
            removals: Arc::from(STRIPPED_HEADERS.as_slice()),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        if config.enable_headers {
            Self::standard()
        } else {
            Self::removals_only()
        }
    }

    pub fn defaults(&self) -> &HeaderMap {
        &self.defaults
    }

    pub fn removals(&self) -> &[HeaderName] {
        &self.removals
    }

    fn enforce_removals(&self, headers: &mut HeaderMap) {
        for name in self.removals.iter() {
            headers.remove(name);
        }
    }
}

/// Response headers staged during the request phase.
///
/// Shared between stages through request extensions; later stages and
/// handlers may read or amend it before the response is finalized.
#[derive(Debug, Clone, Default)]
pub struct PendingHeaders(Arc<Mutex<HeaderMap>>);

impl PendingHeaders {
    fn with(map: HeaderMap) -> Self {
        Self(Arc::new(Mutex::new(map)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeaderMap> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.lock().contains_key(name)
    }

    pub fn remove(&self, name: &HeaderName) {
        self.lock().remove(name);
    }

    fn merge_into(&self, target: &mut HeaderMap) {
        let staged = self.lock();
        for (name, value) in staged.iter() {
            if !target.contains_key(name) {
                target.append(name.clone(), value.clone());
            }
        }
    }
}

/// Security headers stage: stage the defaults, then finalize the response.
pub async fn apply_security_headers(
    State(policy): State<HeaderPolicy>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let pending = PendingHeaders::with(policy.defaults().clone());
    request.extensions_mut().insert(pending.clone());

    let mut response = next.run(request).await;

    pending.merge_into(response.headers_mut());
    policy.enforce_removals(response.headers_mut());
    response
}

/// Header-strip stage: remove the stripped pair from the staged headers
/// and from whatever response comes back.
pub async fn strip_headers(
    State(policy): State<HeaderPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(pending) = request.extensions().get::<PendingHeaders>() {
        for name in policy.removals() {
            pending.remove(name);
        }
    }

    let mut response = next.run(request).await;
    policy.enforce_removals(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn get_root() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn test_standard_policy_contents() {
        let policy = HeaderPolicy::standard();
        assert_eq!(policy.defaults().get("x-content-type-options").unwrap(), "nosniff");
        assert!(policy.defaults().contains_key(header::X_FRAME_OPTIONS));
        assert_eq!(policy.removals().len(), 2);
    }

    #[tokio::test]
    async fn test_defaults_applied_and_pair_removed() {
        let policy = HeaderPolicy::standard();
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(policy.clone(), strip_headers))
            .layer(middleware::from_fn_with_state(policy, apply_security_headers));

        let response = app.oneshot(get_root()).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert!(!headers.contains_key(header::X_FRAME_OPTIONS));
        assert!(!headers.contains_key(header::CONTENT_SECURITY_POLICY));
    }

    #[tokio::test]
    async fn test_pair_visible_between_stages() {
        let policy = HeaderPolicy::standard();
        let inspect = |request: Request<Body>, next: Next| async move {
            let seen = request
                .extensions()
                .get::<PendingHeaders>()
                .map(|p| p.contains(&header::X_FRAME_OPTIONS))
                .unwrap_or(false);
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-inspected-frame-options", HeaderValue::from_static(if seen { "yes" } else { "no" }));
            response
        };
        let after_strip = |request: Request<Body>| async move {
            let pending = request.extensions().get::<PendingHeaders>().cloned().unwrap();
            assert!(!pending.contains(&header::X_FRAME_OPTIONS));
            assert!(pending.contains(&HeaderName::from_static("x-content-type-options")));
            "ok"
        };

        let app = Router::new()
            .route("/", get(after_strip))
            .layer(middleware::from_fn_with_state(policy.clone(), strip_headers))
            .layer(middleware::from_fn(inspect))
            .layer(middleware::from_fn_with_state(policy, apply_security_headers));

        let response = app.oneshot(get_root()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-inspected-frame-options").unwrap(), "yes");
    }

    #[tokio::test]
    async fn test_removal_applies_to_short_circuits_and_handler_headers() {
        let policy = HeaderPolicy::standard();
        let reject = |_request: Request<Body>, _next: Next| async move {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::X_FRAME_OPTIONS, "DENY")],
            )
                .into_response()
        };

        let app = Router::new()
            .route("/", get(|| async { "unreachable" }))
            .layer(middleware::from_fn_with_state(policy.clone(), strip_headers))
            .layer(middleware::from_fn(reject))
            .layer(middleware::from_fn_with_state(policy, apply_security_headers));

        let response = app.oneshot(get_root()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(!response.headers().contains_key(header::X_FRAME_OPTIONS));
        assert!(!response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key("strict-transport-security"));
    }

    #[tokio::test]
    async fn test_handler_values_win() {
        let policy = HeaderPolicy::standard();
        let app = Router::new()
            .route(
                "/",
                get(|| async { ([(header::REFERRER_POLICY, "same-origin")], "ok") }),
            )
            .layer(middleware::from_fn_with_state(policy, apply_security_headers));

        let response = app.oneshot(get_root()).await.unwrap();
        assert_eq!(response.headers().get(header::REFERRER_POLICY).unwrap(), "same-origin");
    }

    #[tokio::test]
    async fn test_disabled_headers_still_strip() {
        let policy = HeaderPolicy::removals_only();
        let app = Router::new()
            .route(
                "/",
                get(|| async { ([(header::CONTENT_SECURITY_POLICY, "default-src *")], "ok") }),
            )
            .layer(middleware::from_fn_with_state(policy, apply_security_headers));

        let response = app.oneshot(get_root()).await.unwrap();
        assert!(!response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(!response.headers().contains_key("x-content-type-options"));
    }
}
