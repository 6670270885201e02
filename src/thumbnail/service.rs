//! Thumbnail service.
//!
//! ```text
//! get_thumbnail(url, max_width)
//!        │
//!        ▼
//!  ┌───────────┐ hit
//!  │ TtlCache  ├──────▶ bytes
//!  └─────┬─────┘
//!        │ miss (single flight per key)
//!        ▼
//!  ┌──────────────┐    ┌──────────────────┐
//!  │ AssetFetcher ├───▶│ ThumbnailEncoder │──▶ cache & return
//!  └──────────────┘    └──────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use super::encoder::{ThumbnailEncoder, MAX_THUMBNAIL_WIDTH};
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::error::ThumbnailError;
use crate::fetch::AssetFetcher;

/// Default thumbnail cache capacity: 64MB
pub const DEFAULT_THUMBNAIL_CACHE_BYTES: usize = 64 * 1024 * 1024;

/// Upper bound on the number of cached thumbnails, independent of size.
const MAX_CACHED_THUMBNAILS: usize = 100_000;

// =============================================================================
// Cache Key
// =============================================================================

/// Thumbnails are memoized per source URL and requested maximum width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub url: String,
    pub max_width: u32,
}

impl ThumbnailKey {
    pub fn new(url: impl Into<String>, max_width: u32) -> Self {
        Self {
            url: url.into(),
            max_width,
        }
    }
}

// =============================================================================
// Thumbnail Response
// =============================================================================

/// Response from the thumbnail service.
#[derive(Debug, Clone)]
pub struct ThumbnailResponse {
    /// The encoded JPEG data
    pub data: Bytes,

    /// Whether the thumbnail was served from cache
    pub cache_hit: bool,
}

// =============================================================================
// Thumbnail Service
// =============================================================================

/// Fetches full-resolution slides and derives cached thumbnails.
///
/// Decode failures propagate to the caller and are not cached, so a broken
/// image is re-fetched on the next request.
pub struct ThumbnailService<F: AssetFetcher> {
    fetcher: Arc<F>,
    cache: TtlCache<ThumbnailKey, Bytes>,
    encoder: ThumbnailEncoder,
}

fn byte_weight(data: &Bytes) -> usize {
    data.len()
}

impl<F: AssetFetcher> ThumbnailService<F> {
    /// Create a service with the default encoder, TTL and 64MB cache.
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_options(
            fetcher,
            ThumbnailEncoder::new(),
            DEFAULT_TTL,
            DEFAULT_THUMBNAIL_CACHE_BYTES,
        )
    }

    /// Create a service with a custom encoder, TTL and cache size in bytes.
    pub fn with_options(
        fetcher: Arc<F>,
        encoder: ThumbnailEncoder,
        ttl: Duration,
        cache_bytes: usize,
    ) -> Self {
        Self {
            fetcher,
            cache: TtlCache::with_weigher(ttl, MAX_CACHED_THUMBNAILS, cache_bytes, byte_weight),
            encoder,
        }
    }

    /// Get the thumbnail of `url`, no wider than `max_width`.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::InvalidWidth`] for a width of 0 or above 4096
    /// - [`ThumbnailError::Fetch`] if the image cannot be downloaded
    /// - [`ThumbnailError::DecodeError`] if the bytes are not an image
    pub async fn get_thumbnail(
        &self,
        url: &str,
        max_width: u32,
    ) -> Result<ThumbnailResponse, ThumbnailError> {
        if max_width == 0 || max_width > MAX_THUMBNAIL_WIDTH {
            return Err(ThumbnailError::InvalidWidth { width: max_width });
        }

        let computed = AtomicBool::new(false);
        let computed_ref = &computed;

        let data = self
            .cache
            .get_or_compute(ThumbnailKey::new(url, max_width), move || async move {
                computed_ref.store(true, Ordering::Relaxed);
                self.generate_thumbnail(url, max_width).await
            })
            .await?;

        Ok(ThumbnailResponse {
            data,
            cache_hit: !computed.load(Ordering::Relaxed),
        })
    }

    /// Fetch and render a thumbnail without touching the cache.
    pub async fn generate_thumbnail(&self, url: &str, max_width: u32) -> Result<Bytes, ThumbnailError> {
        let source = self.fetcher.fetch(url).await?;
        let encoder = self.encoder;

        // Decoding and resampling are CPU bound
        let rendered = tokio::task::spawn_blocking(move || encoder.render(&source, max_width))
            .await
            .map_err(|e| ThumbnailError::EncodeError {
                message: e.to_string(),
            })??;

        debug!(
            url = url,
            width = rendered.width,
            height = rendered.height,
            bytes = rendered.data.len(),
            "Rendered thumbnail"
        );

        Ok(rendered.data)
    }

    /// Drop the cached thumbnail for one `(url, max_width)` pair.
    pub async fn invalidate(&self, url: &str, max_width: u32) {
        self.cache.invalidate(&ThumbnailKey::new(url, max_width)).await;
    }

    /// Get cache statistics.
    ///
    /// Returns `(current_bytes, capacity_bytes, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let size = self.cache.weight().await;
        let capacity = self.cache.max_weight();
        let count = self.cache.len().await;
        (size, capacity, count)
    }

    /// Clear the thumbnail cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub fn encoder(&self) -> &ThumbnailEncoder {
        &self.encoder
    }
}

// =============================================================================
// Tests
// =============================================================================
