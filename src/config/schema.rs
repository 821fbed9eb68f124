//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::collaborators::Feature;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security headers and body limits.
    pub security: SecurityConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Static asset serving under `/images`.
    pub static_assets: StaticAssetsConfig,

    /// Remote endpoints for the feature collaborators.
    pub collaborators: CollaboratorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
///
/// A fixed window per client identity: at most `max_requests` requests are
/// admitted within each `window_secs` window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per window per client.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 1000,
            window_secs: 900,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable default security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Only accept JSON bodies whose top level is an object or array.
    pub strict_validation: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
            strict_validation: true,
        }
    }
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticAssetsConfig {
    /// Directory served under `/images`.
    pub dir: String,
}

impl Default for StaticAssetsConfig {
    fn default() -> Self {
        Self {
            dir: "public/images".to_string(),
        }
    }
}

/// A remote service that implements one feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Absolute URL the validated payload is POSTed to.
    pub url: String,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_endpoint_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint_timeout() -> u64 {
    30
}

/// Per-feature collaborator endpoints. Unset features answer 503.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CollaboratorsConfig {
    pub youtube_transcript: Option<EndpointConfig>,
    pub web_page_reader: Option<EndpointConfig>,
    pub powerpoint_generator: Option<EndpointConfig>,
    pub word_generator: Option<EndpointConfig>,
    pub excel_generator: Option<EndpointConfig>,
}

impl CollaboratorsConfig {
    /// Endpoint configured for `feature`, if any.
    pub fn endpoint(&self, feature: Feature) -> Option<&EndpointConfig> {
        match feature {
            Feature::YoutubeTranscript => self.youtube_transcript.as_ref(),
            Feature::WebPageReader => self.web_page_reader.as_ref(),
            Feature::PowerpointGenerator => self.powerpoint_generator.as_ref(),
            Feature::WordGenerator => self.word_generator.as_ref(),
            Feature::ExcelGenerator => self.excel_generator.as_ref(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.static_assets.dir, "public/images");
        assert!(config.collaborators.word_generator.is_none());
    }

    #[test]
    fn test_collaborator_endpoint_lookup() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [collaborators.word_generator]
            url = "http://127.0.0.1:4000/word"
            "#,
        )
        .unwrap();

        let endpoint = config.collaborators.endpoint(Feature::WordGenerator).unwrap();
        assert_eq!(endpoint.url, "http://127.0.0.1:4000/word");
        assert_eq!(endpoint.timeout_secs, 30);
        assert!(config.collaborators.endpoint(Feature::ExcelGenerator).is_none());
    }
}
