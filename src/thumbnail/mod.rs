//! Thumbnail derivation layer.
//!
//! # Components
//!
//! - [`ThumbnailService`]: Fetch, render and cache thumbnails per `(url, max_width)`
//! - [`ThumbnailEncoder`]: Decode, downscale, flatten onto white, encode JPEG
//! - [`ThumbnailKey`]: Cache key
//! - [`ThumbnailResponse`]: Encoded bytes plus cache-hit flag
//!
//! # Example
//!
//! ```ignore
//! use deck_streamer::thumbnail::ThumbnailService;
//!
//! let service = ThumbnailService::new(fetcher);
//! let response = service.get_thumbnail("https://host/deck/001.png", 280).await?;
//! println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
//! ```

mod encoder;
mod service;

pub use encoder::{
    clamp_quality, flatten_onto_white, is_valid_quality, scaled_size, RenderedThumbnail,
    ThumbnailEncoder, DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_WIDTH, MAX_THUMBNAIL_QUALITY,
    MAX_THUMBNAIL_WIDTH, MIN_THUMBNAIL_QUALITY,
};
pub use service::{
    ThumbnailKey, ThumbnailResponse, ThumbnailService, DEFAULT_THUMBNAIL_CACHE_BYTES,
};
