//! HTTP transport abstraction.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::{Error, FetchError, Result};

/// Capability trait for fetching remote resources.
///
/// Manifest resolution and segment fetching both go through this seam, so
/// tests can run against an in-memory transport and the HTTP stack stays in
/// one place.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the full response body at `url`.
    async fn get(&self, url: &Url) -> std::result::Result<Bytes, FetchError>;
}

/// reqwest-backed transport with a custom client identifier header and a
/// bounded per-request timeout.
pub struct HttpClient {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Build an HTTP client with the given user agent and request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &Url) -> std::result::Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.bytes().await.map_err(|e| self.map_error(e))
    }
}
