//! HTTP client for the chat API: `POST /chat` and `GET /health`.

use std::time::Duration;

use reqwest::Url;

use crate::messages::{ChatRequest, ChatResponse, HealthResponse};

/// Chat API error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `http://localhost:8000`). A `None`
    /// timeout leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask one question. Any non-2xx status is an error carrying the body text.
    pub async fn chat(&self, query: &str) -> Result<ChatResponse, ClientError> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(%url, "sending chat query");

        let res = self
            .http
            .post(&url)
            .json(&ChatRequest::new(query))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat API returned an error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        let response = ChatResponse::from_json(&value);
        tracing::debug!(sources = response.sources.len(), "chat answer received");
        Ok(response)
    }

    /// Returns the server's `ok` flag from `GET /health`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let res = self.http.get(&url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let health: HealthResponse = serde_json::from_str(&body)?;
        Ok(health.ok)
    }
}
