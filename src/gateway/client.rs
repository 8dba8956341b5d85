//! Gateway client — talks to the approval server over HTTP(S).
//!
//! Two calls, both bearer-authenticated and both bounded by the per-call
//! timeout:
//! 1. `create_request` — one POST per invocation
//! 2. `poll_once` — one GET per loop iteration of the lifecycle
//!
//! Neither call retries. Every failure is logged here, with as much detail as
//! the server gave us, and then reported as a plain value.

use crate::approval::types::{ApprovalRequest, PollOutcome, RemoteStatus, RequestTicket};
use crate::approval::ApprovalBackend;
use crate::config::GateConfig;
use crate::credential::Credential;
use crate::error::{GateError, GateResult};
use crate::gateway::protocol::{
    decode_object, CreateAuthRequest, CreateAuthResponse, PollStatusResponse, CREATE_REQUEST_PATH,
    MISSING_STATUS, POLL_PATH_PREFIX,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// HTTP client for the biometric endpoints of the approval server.
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for `base_url` with a per-call timeout.
    pub fn new(base_url: impl Into<String>, per_call_timeout: Duration) -> GateResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(per_call_timeout)
            .connect_timeout(per_call_timeout)
            .build()
            .map_err(|e| GateError::InternalFault(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        Self::new(config.base_url.clone(), config.per_call_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn create_url(&self) -> String {
        format!("{}{}", self.base_url, CREATE_REQUEST_PATH)
    }

    /// The request id is pushed as one encoded path segment, so an id
    /// containing `/` or `?` cannot address a different endpoint.
    fn poll_url(&self, request_id: &str) -> Result<Url, String> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, POLL_PATH_PREFIX))
            .map_err(|e| format!("invalid server URL '{}': {}", self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| format!("server URL '{}' cannot take a path", self.base_url))?
            .pop_if_empty()
            .push(request_id);
        Ok(url)
    }

    /// `POST /api/auth/biometric/request`. Only `201` with a non-empty
    /// `request_id` counts as success.
    pub async fn create_request(
        &self,
        credential: &Credential,
        request: &ApprovalRequest,
    ) -> GateResult<RequestTicket> {
        let body = CreateAuthRequest::from(request);

        let response = self
            .http
            .post(self.create_url())
            .header(AUTHORIZATION, credential.bearer_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Network error creating auth request: {}", e);
                GateError::RequestCreationFailed(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                "Failed to create auth request: {} - {}",
                status.as_u16(),
                text.trim()
            );
            return Err(GateError::RequestCreationFailed(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        let text = response.text().await.map_err(|e| {
            tracing::error!("Error creating auth request: {}", e);
            GateError::RequestCreationFailed(e.to_string())
        })?;
        let parsed: CreateAuthResponse = decode_object(&text).map_err(|e| {
            tracing::error!("Error creating auth request: malformed response: {}", e);
            GateError::RequestCreationFailed(format!("malformed response: {}", e))
        })?;

        let request_id = match parsed.request_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                tracing::error!("Error creating auth request: response has no request_id");
                return Err(GateError::RequestCreationFailed(
                    "response has no request_id".to_string(),
                ));
            }
        };

        Ok(RequestTicket {
            request_id,
            expires_at: parsed.expires_at,
            expires_in: parsed.expires_in,
        })
    }

    /// `GET /api/auth/biometric/poll/{request_id}`. Only `200` with a JSON
    /// object counts as a fetch; a missing `status` reads as "unknown".
    pub async fn poll_once(&self, credential: &Credential, request_id: &str) -> PollOutcome {
        let url = match self.poll_url(request_id) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Error polling auth status: {}", e);
                return PollOutcome::failed();
            }
        };

        let response = match self
            .http
            .get(url)
            .header(AUTHORIZATION, credential.bearer_header())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Network error polling auth status: {}", e);
                return PollOutcome::failed();
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!("Failed to poll auth status: {}", status.as_u16());
            return PollOutcome::failed();
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error polling auth status: {}", e);
                return PollOutcome::failed();
            }
        };

        match decode_object::<PollStatusResponse>(&text) {
            Ok(body) => {
                let remote = body.status.as_deref().unwrap_or(MISSING_STATUS);
                PollOutcome::fetched(RemoteStatus::parse(remote)).with_message(body.message)
            }
            Err(e) => {
                tracing::error!("Error polling auth status: malformed response: {}", e);
                PollOutcome::failed()
            }
        }
    }
}

#[async_trait]
impl ApprovalBackend for GatewayClient {
    async fn create_request(
        &self,
        credential: &Credential,
        request: &ApprovalRequest,
    ) -> GateResult<RequestTicket> {
        GatewayClient::create_request(self, credential, request).await
    }

    async fn poll_once(&self, credential: &Credential, request_id: &str) -> PollOutcome {
        GatewayClient::poll_once(self, credential, request_id).await
    }
}
