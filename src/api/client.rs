use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use super::models::{PollResponse, SubmitRequest};
use super::AnalysisBackend;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};

pub const SEND_REQUEST_PATH: &str = "/api/send-request";
pub const GET_RESPONSE_PATH: &str = "/api/get-response";

/// HTTP client for the analysis backend
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    send_url: Url,
    poll_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical url".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            send_url: endpoint_url(&base, SEND_REQUEST_PATH)?,
            poll_url: endpoint_url(&base, GET_RESPONSE_PATH)?,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn send_url(&self) -> &Url {
        &self.send_url
    }

    pub fn poll_url(&self) -> &Url {
        &self.poll_url
    }
}

// Keeps any path prefix on the base url (e.g. a reverse proxy mount point).
fn endpoint_url(base: &Url, path: &str) -> ApiResult<Url> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl AnalysisBackend for BackendClient {
    async fn submit(&self, input: &str) -> ApiResult<()> {
        let response = self
            .client
            .post(self.send_url.clone())
            .json(&SubmitRequest::new(input))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: SEND_REQUEST_PATH,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "submission rejected by backend");
            return Err(ApiError::Status {
                endpoint: SEND_REQUEST_PATH,
                status,
            });
        }

        tracing::debug!(%status, "submission accepted");
        Ok(())
    }

    async fn poll(&self) -> ApiResult<PollResponse> {
        let response = self
            .client
            .get(self.poll_url.clone())
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: GET_RESPONSE_PATH,
                source,
            })?;

        // The status code is not consulted here; error bodies without a
        // result simply keep the loop waiting.
        let status = response.status();
        let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
            endpoint: GET_RESPONSE_PATH,
            source,
        })?;

        let parsed: PollResponse =
            serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
                endpoint: GET_RESPONSE_PATH,
                source,
            })?;

        tracing::trace!(%status, status_field = ?parsed.status, "poll response");
        Ok(parsed)
    }
}
