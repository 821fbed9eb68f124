//! Collaborator backed by a remote HTTP service.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Collaborator, CollaboratorError, Feature};
use crate::config::EndpointConfig;

/// Forwards the validated payload as a JSON POST to a configured endpoint.
pub struct RemoteCollaborator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RemoteCollaborator {
    pub fn new(client: reqwest::Client, endpoint: &EndpointConfig) -> Self {
        Self {
            client,
            url: endpoint.url.clone(),
            timeout: Duration::from_secs(endpoint.timeout_secs),
        }
    }
}

#[async_trait]
impl Collaborator for RemoteCollaborator {
    async fn invoke(&self, feature: Feature, payload: Value) -> Result<Value, CollaboratorError> {
        tracing::debug!(feature = %feature, url = %self.url, "Forwarding to collaborator");

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout(self.timeout.as_secs())
                } else {
                    CollaboratorError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Upstream(format!(
                "{} answered {}",
                self.url, status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }
}
