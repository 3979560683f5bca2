use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AdvisoryContext, AdvisoryReport, Advisor, generate_request};
use crate::config::AdvisoryConfig;
use crate::error::AdvisoryError;
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, post_json};

/// [`Advisor`] backed by a structured-generation endpoint.
pub struct GeminiAdvisor<C> {
    client: C,
    endpoint: String,
    timeout: Duration,
}

impl GeminiAdvisor<UrlParam<BasicClient>> {
    /// Builds an advisor that authenticates with `?key=` on every request.
    pub fn from_config(config: &AdvisoryConfig) -> Result<Self> {
        let client = UrlParam::new(
            BasicClient::new(config.timeout)?,
            "key",
            config.api_key.clone(),
        );
        Ok(Self::new(client, config.endpoint(), config.timeout))
    }
}

impl<C: HttpClient> GeminiAdvisor<C> {
    pub fn new(client: C, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    async fn request(&self, ctx: &AdvisoryContext) -> Result<String, AdvisoryError> {
        let body = generate_request(ctx);
        let response = post_json(&self.client, &self.endpoint, &body)
            .await
            .map_err(|e| AdvisoryError::Unreachable(format!("{e:#}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Unreachable(format!("status {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| AdvisoryError::Unreachable(e.without_url().to_string()))
    }
}

#[async_trait]
impl<C: HttpClient> Advisor for GeminiAdvisor<C> {
    #[tracing::instrument(skip(self, ctx), fields(sensor_id = %ctx.sensor_id))]
    async fn advise(&self, ctx: &AdvisoryContext) -> Result<AdvisoryReport, AdvisoryError> {
        let body = match tokio::time::timeout(self.timeout, self.request(ctx)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Advisory request timed out");
                return Err(AdvisoryError::Unreachable(format!(
                    "no response within {:?}",
                    self.timeout
                )));
            }
        };
        debug!(bytes = body.len(), "Advisory response received");
        parse_generate_response(&body)
    }
}

/// Extracts the report embedded as JSON text in a `generateContent` response.
pub fn parse_generate_response(body: &str) -> Result<AdvisoryReport, AdvisoryError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| AdvisoryError::BadResponse(format!("response is not JSON: {e}")))?;

    let text = envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| AdvisoryError::BadResponse("response has no candidate text".to_string()))?;

    serde_json::from_str(text)
        .map_err(|e| AdvisoryError::BadResponse(format!("report does not match schema: {e}")))
}
