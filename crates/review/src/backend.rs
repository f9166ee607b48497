//! Transport for the typed review RPC.
//!
//! [`ReviewBackend`] is the seam between the panel and the service: the
//! panel only ever sends a [`ReviewRequest`] and receives the matching
//! [`ReviewResponse`]. [`HttpBackend`] is the production implementation
//! over `reqwest`.

use async_trait::async_trait;
use precinct_core::review::{ReviewRequest, ReviewResponse};
use serde::Deserialize;

use crate::config::ReviewConfig;
use crate::error::ReviewError;

/// Executes one review request against the authoritative store.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn call(&self, request: ReviewRequest) -> Result<ReviewResponse, ReviewError>;
}

/// Standard success envelope: `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Standard error envelope: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
    code: String,
}

/// HTTP client for the device review endpoint.
pub struct HttpBackend {
    client: reqwest::Client,
    config: ReviewConfig,
}

impl HttpBackend {
    pub fn new(config: ReviewConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or decode the error envelope.
    ///
    /// Bodies that are not an error envelope (proxy pages, extractor
    /// rejections) are carried through as the message with code `HTTP_ERROR`.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ReviewError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.code, envelope.error),
            Err(_) => ("HTTP_ERROR".to_string(), body),
        };
        Err(ReviewError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    /// Parse a successful `{ "data": ... }` body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReviewError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<DataEnvelope<T>>().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn call(&self, request: ReviewRequest) -> Result<ReviewResponse, ReviewError> {
        let action = request.action();
        tracing::debug!(action, "Sending review request");

        let response = self
            .client
            .post(self.config.review_url())
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await?;

        let result = Self::parse_response::<ReviewResponse>(response).await;
        if let Err(ref e) = result {
            tracing::debug!(action, error = %e, "Review request failed");
        }
        result
    }
}
