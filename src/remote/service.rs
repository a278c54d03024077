//! Core `ShapeService` trait and the HTTP implementation.
//!
//! `HttpShapeService` calls the generation server's `POST /generate` route.
//! All connection details come from [`RemoteConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use super::response::{GenerateRequest, ShapeResponse};
use crate::config::RemoteConfig;

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching a generated shape.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP transport or connection error.
    #[error("shape request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("shape request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("shape server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse shape response: {0}")]
    Parse(String),

    /// The payload arrays could not be decoded.
    #[error("failed to decode shape payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Request(e.to_string())
        }
    }
}

impl From<base64::DecodeError> for RemoteError {
    fn from(e: base64::DecodeError) -> Self {
        RemoteError::Decode(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// ShapeService trait
// ---------------------------------------------------------------------------

/// Async, out-of-process shape generation.
///
/// `Ok(None)` and `Err(_)` are both treated as "no shape"; the coordinator
/// falls back to a local target in either case.
#[async_trait]
pub trait ShapeService: Send + Sync {
    async fn generate_shape(&self, prompt: &str) -> Result<Option<ShapeResponse>, RemoteError>;
}

// ---------------------------------------------------------------------------
// HttpShapeService
// ---------------------------------------------------------------------------

/// Talks to the generation server over HTTP.
pub struct HttpShapeService {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl HttpShapeService {
    /// Build a service from config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Trim and cap the prompt the way the server validates it.
    pub fn prepare_prompt(&self, prompt: &str) -> String {
        prompt
            .trim()
            .chars()
            .take(self.config.max_prompt_chars)
            .collect()
    }

    fn build_request(&self, text: String) -> reqwest::RequestBuilder {
        let url = format!("{}/generate", self.config.base_url.trim_end_matches('/'));
        let mut req = self.client.post(&url).json(&GenerateRequest { text });

        // The server rejects non-health routes without a matching key.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.header("X-API-Key", key);
        }
        req
    }
}

#[async_trait]
impl ShapeService for HttpShapeService {
    async fn generate_shape(&self, prompt: &str) -> Result<Option<ShapeResponse>, RemoteError> {
        let text = self.prepare_prompt(prompt);
        if text.is_empty() {
            return Ok(None);
        }

        let response = self.build_request(text).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"].as_str().unwrap_or("unknown error").to_string();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let shape: ShapeResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        if shape.positions.is_empty() {
            return Ok(None);
        }
        Ok(Some(shape))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
