//! # Deck Streamer
//!
//! A slide-deck server for numbered slide images hosted on a plain HTTP host
//! (a static bucket, a CDN, raw GitHub content).
//!
//! Slides are addressed by a deterministic template,
//! `{root}/{prefix}{slot:03}{suffix}{ext}`. The server probes every slot of a
//! configured range, keeps the first suffix variant that exists, and serves
//! the resulting deck with derived thumbnails and per-viewer navigation.
//!
//! ## Features
//!
//! - **Memoized discovery**: Existence probes are cached per URL with a TTL
//! - **Concurrent resolution**: Slots probe in parallel; output stays in slot order
//! - **Deterministic thumbnails**: Lanczos3 downscale, flattened onto white, JPEG
//! - **Explicit sessions**: Each viewer owns its navigation state
//!
//! ## Architecture
//!
//! - [`fetch`] - Remote asset access (`AssetFetcher`, reqwest-based `HttpFetcher`)
//! - [`cache`] - TTL + LRU cache with single-flight computation
//! - [`discovery`] - Templates, suffix variants, existence prober, slide resolver
//! - [`thumbnail`] - Thumbnail encoder and cached service
//! - [`session`] - Navigation state machine, sessions and session store
//! - [`service`] - `DeckService` wiring it all together
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deck_streamer::{DeckService, HttpFetcher, ResolveRequest, SlideTemplate, SuffixOrder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let template = SlideTemplate::new("https://assets.example.com/deck", "260112.", ".png")?;
//!     let order = SuffixOrder::parse(&["a", ""])?;
//!     let request = ResolveRequest::new(template, 1, 120, order)?;
//!
//!     let service = DeckService::new(Arc::new(HttpFetcher::new()?), request);
//!     let deck = service.deck().await?;
//!     for slide in deck.slides() {
//!         println!("{} {}", slide.position, slide.display_name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod server;
pub mod service;
pub mod session;
pub mod thumbnail;

// Re-export commonly used types
pub use cache::TtlCache;
pub use config::{Cli, Command, DeckArgs, ResolveConfig, ServeConfig};
pub use discovery::{
    Candidate, ExistenceProber, ResolveRequest, ResolvedSlide, SlideDeck, SlideResolver,
    SlideTemplate, SuffixOrder, SuffixVariant,
};
pub use error::{FetchError, ResolveError, SessionError, TemplateError, ThumbnailError};
pub use fetch::{create_http_client, AssetFetcher, HttpFetcher};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use service::{DeckOptions, DeckService};
pub use session::{FitMode, NavigationState, Session, SessionId, SessionSnapshot, SessionStore};
pub use thumbnail::{ThumbnailEncoder, ThumbnailResponse, ThumbnailService};
