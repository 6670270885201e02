//! HTTP server layer for Deck Streamer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     /slides   /thumbnails/{n}.jpg   /sessions/{id}/...          │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (requests, error mapping)│  │ (router config, CORS, trace)│  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └────────────────────────────────┬────────────────────────────────┘
//!                                  ▼
//!                             DeckService
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, parse_slide_number, slides_handler, thumbnail_handler, AppState, ErrorResponse,
    HandlerError, HealthResponse, PageThumbnailStatus, PageThumbnailsResponse,
    SessionActionResponse, SlidesResponse, ThumbnailQueryParams, THUMBNAIL_CACHE_HIT_HEADER,
};
pub use routes::{create_default_router, create_router, RouterConfig};
