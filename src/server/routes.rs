//! Router configuration for Deck Streamer.
//!
//! # Route Structure
//!
//! ```text
//! /health                              - Health check
//! /slides                              - Resolved slide list
//! /thumbnails/{n}.jpg                  - Thumbnail of slide n (1-based)
//! /sessions                            - Open a session (POST)
//! /sessions/{id}                       - Session snapshot
//! /sessions/{id}/thumbnails            - Current page thumbnails
//! /sessions/{id}/next|previous|first   - Navigation (POST)
//! /sessions/{id}/jump/{n}              - Jump to slide n (POST)
//! /sessions/{id}/select/{index}        - Select slide by index (POST)
//! /sessions/{id}/page/{p}              - Switch thumbnail page (POST)
//! /sessions/{id}/fit/toggle            - Toggle fit mode (POST)
//! /sessions/{id}/fit?value=N           - Set fit parameter (POST)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use deck_streamer::server::{create_router, RouterConfig};
//! use deck_streamer::DeckService;
//!
//! let service = DeckService::new(fetcher, request);
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_session_handler, first_handler, fit_param_handler, get_session_handler, health_handler,
    jump_handler, next_handler, page_handler, page_thumbnails_handler, previous_handler,
    select_handler, slides_handler, thumbnail_handler, toggle_fit_handler, AppState,
};
use crate::fetch::AssetFetcher;
use crate::service::DeckService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router<F>(service: DeckService<F>, config: RouterConfig) -> Router
where
    F: AssetFetcher + 'static,
{
    let app_state = AppState::with_cache_max_age(service, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/slides", get(slides_handler::<F>))
        .route("/thumbnails/{filename}", get(thumbnail_handler::<F>))
        .route("/sessions", post(create_session_handler::<F>))
        .route("/sessions/{id}", get(get_session_handler::<F>))
        .route("/sessions/{id}/thumbnails", get(page_thumbnails_handler::<F>))
        .route("/sessions/{id}/next", post(next_handler::<F>))
        .route("/sessions/{id}/previous", post(previous_handler::<F>))
        .route("/sessions/{id}/first", post(first_handler::<F>))
        .route("/sessions/{id}/jump/{n}", post(jump_handler::<F>))
        .route("/sessions/{id}/select/{index}", post(select_handler::<F>))
        .route("/sessions/{id}/page/{p}", post(page_handler::<F>))
        .route("/sessions/{id}/fit", post(fit_param_handler::<F>))
        .route("/sessions/{id}/fit/toggle", post(toggle_fit_handler::<F>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Create a router with default configuration.
pub fn create_default_router<F>(service: DeckService<F>) -> Router
where
    F: AssetFetcher + 'static,
{
    create_router(service, RouterConfig::new())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
