//! HTTP request handlers for the Deck Streamer API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - `GET /slides` - Resolved slide list
//! - `GET /thumbnails/{n}.jpg` - Thumbnail of slide `n` (1-based)
//! - `POST /sessions` - Open a viewer session
//! - `GET /sessions/{id}` - Session snapshot
//! - `GET /sessions/{id}/thumbnails` - Thumbnail status of the current page
//! - `POST /sessions/{id}/...` - Navigation actions

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::discovery::ResolvedSlide;
use crate::error::{FetchError, ResolveError, SessionError, ThumbnailError};
use crate::fetch::AssetFetcher;
use crate::service::DeckService;
use crate::session::{Session, SessionId, SessionSnapshot};

/// Response header reporting whether a thumbnail came from cache.
pub const THUMBNAIL_CACHE_HIT_HEADER: &str = "x-thumbnail-cache-hit";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the deck service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<F: AssetFetcher> {
    /// The deck service: resolution, thumbnails and sessions
    pub service: Arc<DeckService<F>>,

    /// Default cache control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl<F: AssetFetcher> AppState<F> {
    /// Create a new application state with the given deck service.
    pub fn new(service: DeckService<F>) -> Self {
        Self::with_cache_max_age(service, 3600)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(service: DeckService<F>, cache_max_age: u32) -> Self {
        Self {
            service: Arc::new(service),
            cache_max_age,
        }
    }
}

impl<F: AssetFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for thumbnail requests.
#[derive(Debug, Deserialize)]
pub struct ThumbnailQueryParams {
    /// Maximum thumbnail width (defaults to the configured width)
    #[serde(default)]
    pub width: Option<u32>,
}

/// Query parameters for setting the fit parameter.
#[derive(Debug, Deserialize)]
pub struct FitQueryParams {
    pub value: u32,
}

/// Parse a 1-based slide number from `{n}` or `{n}.jpg`.
pub fn parse_slide_number(filename: &str) -> Option<usize> {
    let number = filename.strip_suffix(".jpg").unwrap_or(filename);
    match number.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "no_slides")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Response from the slides list endpoint.
#[derive(Debug, Serialize)]
pub struct SlidesResponse {
    /// Address pattern the deck was resolved from
    pub pattern: String,

    /// Number of resolved slides
    pub count: usize,

    /// Slides in deck order
    pub slides: Vec<ResolvedSlide>,
}

/// Response from navigation actions.
#[derive(Debug, Serialize)]
pub struct SessionActionResponse {
    /// Whether the action changed anything; out-of-range input is ignored
    pub applied: bool,

    pub session: SessionSnapshot,
}

/// Status of one thumbnail on the current page.
#[derive(Debug, Serialize)]
pub struct PageThumbnailStatus {
    /// 0-based slide position
    pub position: usize,

    /// Path of the thumbnail on this server
    pub path: String,

    /// Encoded size in bytes, when derivation succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,

    /// Failure message, when derivation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response from the page thumbnails endpoint.
#[derive(Debug, Serialize)]
pub struct PageThumbnailsResponse {
    pub page: usize,
    pub page_count: usize,
    pub thumbnails: Vec<PageThumbnailStatus>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Build a JSON error response, logging by severity:
/// - 5xx errors at ERROR level
/// - 404 at DEBUG level (common and expected)
/// - other 4xx at WARN level
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        match &self {
            ResolveError::EmptyResultSet { .. } => {
                error_response(StatusCode::NOT_FOUND, "no_slides", self.to_string())
            }
            // Range and suffix order come from server configuration
            ResolveError::InvalidRange { .. }
            | ResolveError::RangeTooWide { .. }
            | ResolveError::EmptySuffixOrder => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "invalid_configuration",
                self.to_string(),
            ),
        }
    }
}

impl IntoResponse for ThumbnailError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ThumbnailError::Resolve(e) => return e.clone().into_response(),
            ThumbnailError::SlideNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ThumbnailError::InvalidWidth { .. } => (StatusCode::BAD_REQUEST, "invalid_width"),
            ThumbnailError::Fetch(FetchError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout")
            }
            ThumbnailError::Fetch(_) => (StatusCode::BAD_GATEWAY, "fetch_error"),
            ThumbnailError::DecodeError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "decode_error")
            }
            ThumbnailError::EncodeError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "encode_error")
            }
        };
        error_response(status, error_type, self.to_string())
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match self {
            SessionError::NotFound(_) => {
                error_response(StatusCode::NOT_FOUND, "session_not_found", self.to_string())
            }
            SessionError::Resolve(e) => e.into_response(),
        }
    }
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum HandlerError {
    Resolve(ResolveError),
    Thumbnail(ThumbnailError),
    Session(SessionError),
    InvalidPath(String),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Resolve(e) => e.into_response(),
            HandlerError::Thumbnail(e) => e.into_response(),
            HandlerError::Session(e) => e.into_response(),
            HandlerError::InvalidPath(message) => {
                error_response(StatusCode::BAD_REQUEST, "invalid_path", message)
            }
        }
    }
}

impl From<ResolveError> for HandlerError {
    fn from(err: ResolveError) -> Self {
        HandlerError::Resolve(err)
    }
}

impl From<ThumbnailError> for HandlerError {
    fn from(err: ThumbnailError) -> Self {
        HandlerError::Thumbnail(err)
    }
}

impl From<SessionError> for HandlerError {
    fn from(err: SessionError) -> Self {
        HandlerError::Session(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle slides list requests.
///
/// # Endpoint
///
/// `GET /slides`
///
/// # Response
///
/// - `200 OK`: Slides in deck order
/// - `404 Not Found`: No slot resolved (`no_slides`)
pub async fn slides_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
) -> Result<Json<SlidesResponse>, HandlerError> {
    let deck = state.service.deck().await?;

    Ok(Json(SlidesResponse {
        pattern: state.service.request().template.pattern(),
        count: deck.len(),
        slides: deck.slides().to_vec(),
    }))
}

/// Handle thumbnail requests.
///
/// # Endpoint
///
/// `GET /thumbnails/{n}.jpg`
///
/// # Query Parameters
///
/// - `width`: Maximum width in pixels (default: configured thumbnail width)
///
/// # Response
///
/// - `200 OK`: JPEG thumbnail
/// - `400 Bad Request`: Malformed slide number or width
/// - `404 Not Found`: No slide with that number
/// - `502 Bad Gateway`: The full-resolution image could not be fetched
/// - `500 Internal Server Error`: The image could not be decoded
///
/// # Headers
///
/// - `Content-Type: image/jpeg`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Thumbnail-Cache-Hit: true|false`
pub async fn thumbnail_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(filename): Path<String>,
    Query(query): Query<ThumbnailQueryParams>,
) -> Result<Response, HandlerError> {
    let number = parse_slide_number(&filename).ok_or_else(|| {
        HandlerError::InvalidPath(format!(
            "Invalid slide number '{}': expected a positive integer, optionally followed by .jpg",
            filename
        ))
    })?;

    let response = state.service.thumbnail_at(number - 1, query.width).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
            (
                HeaderName::from_static(THUMBNAIL_CACHE_HIT_HEADER),
                response.cache_hit.to_string(),
            ),
        ],
        response.data,
    )
        .into_response())
}

/// Open a session on the current deck.
///
/// `POST /sessions` → `201 Created` with the session snapshot, or `404
/// no_slides` when the deck is empty.
pub async fn create_session_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
) -> Result<Response, HandlerError> {
    let session = state.service.new_session().await?;
    Ok((StatusCode::CREATED, Json(session.snapshot())).into_response())
}

/// `GET /sessions/{id}`
pub async fn get_session_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let session = state.service.session(id.parse()?).await?;
    Ok(Json(session.snapshot()))
}

/// Derive every thumbnail of the session's current page.
///
/// `GET /sessions/{id}/thumbnails`
///
/// Always `200 OK` for a known session; failures are reported per entry.
pub async fn page_thumbnails_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<PageThumbnailsResponse>, HandlerError> {
    let session = state.service.session(id.parse()?).await?;

    let thumbnails = session
        .page_thumbnails()
        .await
        .into_iter()
        .map(|t| {
            let path = format!("/thumbnails/{}.jpg", t.position + 1);
            match t.result {
                Ok(data) => PageThumbnailStatus {
                    position: t.position,
                    path,
                    bytes: Some(data.len()),
                    error: None,
                },
                Err(e) => PageThumbnailStatus {
                    position: t.position,
                    path,
                    bytes: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    Ok(Json(PageThumbnailsResponse {
        page: session.navigation().thumbnail_page(),
        page_count: session.navigation().page_count(),
        thumbnails,
    }))
}

async fn apply<F: AssetFetcher + 'static>(
    state: &AppState<F>,
    id: &str,
    action: impl FnOnce(&mut Session<F>) -> bool,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    let id: SessionId = id.parse()?;
    let (applied, session) = state.service.update_session(id, action).await?;
    Ok(Json(SessionActionResponse {
        applied,
        session: session.snapshot(),
    }))
}

/// `POST /sessions/{id}/next`
pub async fn next_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| {
        s.navigation_mut().next();
        true
    })
    .await
}

/// `POST /sessions/{id}/previous`
pub async fn previous_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| {
        s.navigation_mut().previous();
        true
    })
    .await
}

/// `POST /sessions/{id}/first`
pub async fn first_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| {
        s.navigation_mut().go_first();
        true
    })
    .await
}

/// `POST /sessions/{id}/jump/{n}` with a 1-based slide number.
pub async fn jump_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path((id, n)): Path<(String, usize)>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| s.navigation_mut().jump_to(n)).await
}

/// `POST /sessions/{id}/select/{index}` with a 0-based index.
pub async fn select_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| s.navigation_mut().select(index)).await
}

/// `POST /sessions/{id}/page/{p}` with a 1-based page number.
pub async fn page_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path((id, page)): Path<(String, usize)>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| s.navigation_mut().set_page(page)).await
}

/// `POST /sessions/{id}/fit/toggle`
pub async fn toggle_fit_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| {
        s.navigation_mut().toggle_fit_mode();
        true
    })
    .await
}

/// `POST /sessions/{id}/fit?value=N`
///
/// The value is clamped into the active mode's range.
pub async fn fit_param_handler<F: AssetFetcher + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
    Query(query): Query<FitQueryParams>,
) -> Result<Json<SessionActionResponse>, HandlerError> {
    apply(&state, &id, |s| {
        s.navigation_mut().set_fit_param(query.value);
        true
    })
    .await
}

// =============================================================================
// Tests
// =============================================================================
