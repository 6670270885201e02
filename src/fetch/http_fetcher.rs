use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};

use super::AssetFetcher;
use crate::error::FetchError;

/// Default per-request timeout: 8 seconds
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// HTTP-backed implementation of AssetFetcher.
///
/// Every request is bounded by the timeout configured on the underlying
/// client, so a slow host can never stall a resolution pass indefinitely.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: create_http_client(timeout)?,
        })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn check(&self, url: &str) -> Result<(), FetchError> {
        let response = self.send(url).await?;

        // Dropping the response closes the body stream without reading it
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            })
        }
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self.send(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(url, e))
    }
}

/// Create an HTTP client with a bounded per-request timeout.
///
/// ```ignore
/// let client = create_http_client(Duration::from_secs(8))?;
/// ```
pub fn create_http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("deck-streamer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Connection(e.to_string()))
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_builder() {
        FetchError::InvalidUrl(url.to_string())
    } else {
        FetchError::Connection(err.to_string())
    }
}
