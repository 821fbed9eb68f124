//! Request identity.
//!
//! # Responsibilities
//! - Derive the client identity behind a single trusted reverse proxy
//! - Expose the request id assigned when the request enters the pipeline
//!
//! # Design Decisions
//! - Exactly one proxy hop is trusted: the right-most `X-Forwarded-For`
//!   entry is the address our proxy saw, anything left of it is
//!   client-controlled and ignored
//! - Identity is attached once, as a request extension, so the rate limiter
//!   and the logger always agree on who the client is

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Number of reverse-proxy hops trusted when deriving the client address.
pub const TRUSTED_PROXY_HOPS: usize = 1;

/// The address used to key rate limiting and logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Resolve the client address.
    ///
    /// The hop chain is the socket peer followed by the `X-Forwarded-For`
    /// entries from right to left. The first `trusted_hops` links are
    /// trusted proxies; the next one is the client. When the chain is
    /// shorter, the furthest known address is used.
    pub fn resolve(forwarded_for: Option<&str>, peer: Option<IpAddr>, trusted_hops: usize) -> Self {
        let forwarded: Vec<&str> = forwarded_for
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let mut chain: Vec<String> = Vec::with_capacity(forwarded.len() + 1);
        match peer {
            Some(ip) => chain.push(ip.to_string()),
            // No socket peer (in-process calls): the proxy hop is implicit.
            None if trusted_hops > 0 => chain.push(String::new()),
            None => {}
        }
        chain.extend(forwarded.iter().rev().map(|s| s.to_string()));

        let index = trusted_hops.min(chain.len().saturating_sub(1));
        match chain.get(index) {
            Some(addr) if !addr.is_empty() => Self(addr.clone()),
            _ => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Trust-proxy stage: attach the [`ClientIdentity`] extension.
pub async fn resolve_client_identity(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let forwarded = forwarded_for(request.headers());

    let identity = ClientIdentity::resolve(forwarded.as_deref(), peer, TRUSTED_PROXY_HOPS);
    request.extensions_mut().insert(identity);

    next.run(request).await
}

/// Client identity attached by the trust-proxy stage.
pub fn client_identity<B>(request: &Request<B>) -> ClientIdentity {
    request
        .extensions()
        .get::<ClientIdentity>()
        .cloned()
        .unwrap_or_else(ClientIdentity::unknown)
}

/// Request id assigned on entry to the pipeline, if any.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}
