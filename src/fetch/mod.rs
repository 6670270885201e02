//! Remote asset access.
//!
//! Everything above this layer talks to the asset host through the
//! [`AssetFetcher`] trait, so tests can swap in an in-memory host.

mod http_fetcher;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

pub use http_fetcher::{create_http_client, HttpFetcher, DEFAULT_FETCH_TIMEOUT};

/// Trait for reading slide assets from a remote host.
///
/// Implementations must be thread-safe; one fetcher is shared by every
/// prober, resolver and thumbnail task in the process.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Check that `url` answers with `200 OK`.
    ///
    /// The response body is not read. Any other status, a timeout or a
    /// transport failure is reported as an error.
    async fn check(&self, url: &str) -> Result<(), FetchError>;

    /// Fetch the full body of `url`.
    ///
    /// Succeeds for any 2xx status.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}
