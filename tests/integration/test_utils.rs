//! Test utilities for integration tests.
//!
//! Provides an in-memory asset host that records every request, and helpers
//! for generating slide images and building services over it.

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use deck_streamer::error::FetchError;
use deck_streamer::{
    create_router, AssetFetcher, DeckService, ResolveRequest, RouterConfig, SlideTemplate,
    SuffixOrder,
};

/// Root every mock deck lives under.
pub const DECK_ROOT: &str = "https://assets.example.com/deck";

/// File name prefix of mock slides.
pub const DECK_PREFIX: &str = "F25_Ch01.";

// =============================================================================
// Mock Asset Host
// =============================================================================

/// An in-memory asset host keyed by absolute URL.
///
/// Counts `check` and `fetch` calls separately so tests can assert on
/// memoization.
#[derive(Clone, Default)]
pub struct MockAssetHost {
    assets: Arc<RwLock<HashMap<String, Bytes>>>,
    checks: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl MockAssetHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset below [`DECK_ROOT`].
    pub fn with_file(self, file_name: &str, data: Vec<u8>) -> Self {
        self.put(file_name, data);
        self
    }

    pub fn put(&self, file_name: &str, data: Vec<u8>) {
        let url = format!("{}/{}", DECK_ROOT, file_name);
        if let Ok(mut assets) = self.assets.write() {
            assets.insert(url, Bytes::from(data));
        }
    }

    pub fn remove(&self, file_name: &str) {
        let url = format!("{}/{}", DECK_ROOT, file_name);
        if let Ok(mut assets) = self.assets.write() {
            assets.remove(&url);
        }
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str) -> Option<Bytes> {
        self.assets.read().ok()?.get(url).cloned()
    }
}

#[async_trait]
impl AssetFetcher for MockAssetHost {
    async fn check(&self, url: &str) -> Result<(), FetchError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match self.lookup(url) {
            Some(_) => Ok(()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.lookup(url).ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

// =============================================================================
// Image Helpers
// =============================================================================

/// Encode a solid-colour RGBA PNG.
pub fn create_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .expect("PNG encoding should succeed");
    buf
}

/// A typical 4:3 opaque slide.
pub fn create_slide_png() -> Vec<u8> {
    create_png(800, 600, [30, 60, 120, 255])
}

/// Check for the JPEG SOI marker.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// File name of a mock slide, e.g. `F25_Ch01.003a.png`.
pub fn slide_name(slot: u32, suffix: &str) -> String {
    format!("{}{:03}{}.png", DECK_PREFIX, slot, suffix)
}

// =============================================================================
// Service Builders
// =============================================================================

/// Request for slots `start..=end` with the given suffix priority.
pub fn request(start: u32, end: u32, suffixes: &[&str]) -> ResolveRequest {
    let template = SlideTemplate::new(DECK_ROOT, DECK_PREFIX, ".png").expect("valid template");
    let order = SuffixOrder::parse(suffixes).expect("valid suffix order");
    ResolveRequest::new(template, start, end, order).expect("valid request")
}

/// Host with one opaque slide per listed `(slot, suffix)`.
pub fn host_with_slides(slides: &[(u32, &str)]) -> MockAssetHost {
    let host = MockAssetHost::new();
    for (slot, suffix) in slides {
        host.put(&slide_name(*slot, suffix), create_slide_png());
    }
    host
}

pub fn service(host: &MockAssetHost, request: ResolveRequest) -> DeckService<MockAssetHost> {
    DeckService::new(Arc::new(host.clone()), request)
}

/// Router without request tracing.
pub fn router(host: &MockAssetHost, request: ResolveRequest) -> Router {
    create_router(service(host, request), RouterConfig::new().with_tracing(false))
}
