//! Feature collaborators.
//!
//! The gateway does not render documents or fetch transcripts itself. Each
//! feature route validates its payload and hands it to a [`Collaborator`],
//! which answers with a JSON value or a typed failure.
//!
//! # Data Flow
//! ```text
//! POST /word-generator
//!     → JsonPayload<WordDocumentRequest> (parse + validate)
//!     → CollaboratorRegistry::get(Feature::WordGenerator)
//!     → Collaborator::invoke (remote.rs: POST to configured endpoint)
//!     → ServiceResponse envelope
//! ```
//!
//! Handler futures are dropped when the client disconnects, which drops any
//! in-flight upstream request with them.

pub mod payloads;
pub mod remote;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::CollaboratorsConfig;
use crate::error::GatewayError;

pub use payloads::FeaturePayload;
pub use remote::RemoteCollaborator;

/// The feature routes served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    YoutubeTranscript,
    WebPageReader,
    PowerpointGenerator,
    WordGenerator,
    ExcelGenerator,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::YoutubeTranscript,
        Feature::WebPageReader,
        Feature::PowerpointGenerator,
        Feature::WordGenerator,
        Feature::ExcelGenerator,
    ];

    /// Mount prefix of the feature route.
    pub fn path(&self) -> &'static str {
        match self {
            Feature::YoutubeTranscript => "/youtube-transcript",
            Feature::WebPageReader => "/web-page-reader",
            Feature::PowerpointGenerator => "/powerpoint-generator",
            Feature::WordGenerator => "/word-generator",
            Feature::ExcelGenerator => "/excel-generator",
        }
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        &self.path()[1..]
    }

    /// Key of the feature's section under `[collaborators]`.
    pub fn config_key(&self) -> &'static str {
        match self {
            Feature::YoutubeTranscript => "youtube_transcript",
            Feature::WebPageReader => "web_page_reader",
            Feature::PowerpointGenerator => "powerpoint_generator",
            Feature::WordGenerator => "word_generator",
            Feature::ExcelGenerator => "excel_generator",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Feature::YoutubeTranscript => "Transcript fetched",
            Feature::WebPageReader => "Web page read",
            Feature::PowerpointGenerator => "PowerPoint presentation generated",
            Feature::WordGenerator => "Word document generated",
            Feature::ExcelGenerator => "Excel workbook generated",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a collaborator can raise.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or rejected the call.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("upstream timed out after {0} seconds")]
    Timeout(u64),

    /// The collaborator answered with something that is not JSON.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("collaborator setup failed: {0}")]
    Setup(String),
}

impl From<CollaboratorError> for GatewayError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Timeout(_) => GatewayError::UpstreamTimeout(err.to_string()),
            CollaboratorError::Upstream(_) | CollaboratorError::InvalidResponse(_) => {
                GatewayError::Upstream(err.to_string())
            }
            CollaboratorError::Setup(_) => GatewayError::Unexpected(err.to_string()),
        }
    }
}

/// A unit of business logic behind one feature route.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn invoke(&self, feature: Feature, payload: Value) -> Result<Value, CollaboratorError>;
}

/// Feature → collaborator lookup shared by the feature handlers.
#[derive(Clone, Default)]
pub struct CollaboratorRegistry {
    entries: HashMap<Feature, Arc<dyn Collaborator>>,
}

impl CollaboratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build remote collaborators for every endpoint in the config.
    pub fn from_config(config: &CollaboratorsConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CollaboratorError::Setup(e.to_string()))?;

        let mut registry = Self::new();
        for feature in Feature::ALL {
            if let Some(endpoint) = config.endpoint(feature) {
                tracing::info!(feature = %feature, url = %endpoint.url, "Collaborator configured");
                registry.register(feature, RemoteCollaborator::new(client.clone(), endpoint));
            } else {
                tracing::warn!(feature = %feature, "No collaborator configured; route will answer 503");
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, feature: Feature, collaborator: impl Collaborator + 'static) {
        self.entries.insert(feature, Arc::new(collaborator));
    }

    pub fn with(mut self, feature: Feature, collaborator: impl Collaborator + 'static) -> Self {
        self.register(feature, collaborator);
        self
    }

    pub fn get(&self, feature: Feature) -> Option<Arc<dyn Collaborator>> {
        self.entries.get(&feature).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
