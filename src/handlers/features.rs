//! Feature route handlers.
//!
//! Every feature shares one handler body, instantiated per payload type:
//! the payload is extracted and validated by [`JsonPayload`] before the
//! handler runs, then forwarded to the feature's collaborator.

use std::sync::Arc;

use axum::{extract::State, routing::post, routing::MethodRouter};
use serde_json::Value;

use crate::collaborators::payloads::{
    PresentationRequest, WebPageReaderRequest, WordDocumentRequest, WorkbookRequest,
    YoutubeTranscriptRequest,
};
use crate::collaborators::{CollaboratorRegistry, Feature, FeaturePayload};
use crate::error::GatewayError;
use crate::http::body::JsonPayload;
use crate::http::response::ServiceResponse;
use crate::observability::metrics;

type Registry = Arc<CollaboratorRegistry>;

/// Forward a validated payload to the feature's collaborator.
pub async fn invoke<P: FeaturePayload>(
    State(registry): State<Registry>,
    JsonPayload(payload): JsonPayload<P>,
) -> Result<ServiceResponse<Value>, GatewayError> {
    let feature = P::FEATURE;
    let Some(collaborator) = registry.get(feature) else {
        metrics::record_collaborator_call(feature.as_str(), "unavailable");
        return Err(GatewayError::Unavailable(format!(
            "The {feature} service is not available"
        )));
    };

    let payload = serde_json::to_value(&payload)
        .map_err(|e| GatewayError::Unexpected(format!("failed to encode {feature} payload: {e}")))?;

    tracing::debug!(feature = %feature, "Invoking collaborator");
    match collaborator.invoke(feature, payload).await {
        Ok(result) => {
            metrics::record_collaborator_call(feature.as_str(), "ok");
            Ok(ServiceResponse::success(feature.success_message(), Some(result)))
        }
        Err(err) => {
            metrics::record_collaborator_call(feature.as_str(), "error");
            Err(err.into())
        }
    }
}

/// The method router serving `feature`.
pub fn route(feature: Feature) -> MethodRouter<Registry> {
    match feature {
        Feature::YoutubeTranscript => post(invoke::<YoutubeTranscriptRequest>),
        Feature::WebPageReader => post(invoke::<WebPageReaderRequest>),
        Feature::PowerpointGenerator => post(invoke::<PresentationRequest>),
        Feature::WordGenerator => post(invoke::<WordDocumentRequest>),
        Feature::ExcelGenerator => post(invoke::<WorkbookRequest>),
    }
}
