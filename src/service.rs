//! Deck service.
//!
//! Process-wide entry point wiring the discovery layer, the thumbnail layer
//! and the session store around one configured [`ResolveRequest`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       DeckService                        │
//! │                                                          │
//! │  deck() ───────────▶ SlideResolver ──▶ ExistenceProber   │
//! │  thumbnail_at() ───▶ ThumbnailService                    │
//! │  new_session() ────▶ SessionStore                        │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::discovery::{
    ExistenceProber, ResolveRequest, SlideDeck, SlideResolver, DEFAULT_PROBE_CONCURRENCY,
};
use crate::error::{ResolveError, SessionError, ThumbnailError};
use crate::fetch::AssetFetcher;
use crate::session::{Session, SessionId, SessionStore, DEFAULT_MAX_SESSIONS, DEFAULT_PAGE_SIZE};
use crate::thumbnail::{
    ThumbnailEncoder, ThumbnailResponse, ThumbnailService, DEFAULT_THUMBNAIL_CACHE_BYTES,
    DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_WIDTH,
};

/// Tunables for a [`DeckService`].
#[derive(Debug, Clone)]
pub struct DeckOptions {
    /// Validity window of probe, deck and thumbnail caches
    pub cache_ttl: Duration,

    /// Number of URLs whose existence is remembered
    pub probe_cache_entries: usize,

    /// Slots probed at the same time
    pub probe_concurrency: usize,

    /// Default maximum thumbnail width in pixels
    pub thumbnail_width: u32,

    /// JPEG quality of thumbnails
    pub thumbnail_quality: u8,

    /// Thumbnail cache capacity in bytes
    pub thumbnail_cache_bytes: usize,

    /// Thumbnails per grid page
    pub page_size: NonZeroUsize,

    /// Live sessions kept in memory
    pub max_sessions: usize,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            probe_cache_entries: DEFAULT_MAX_ENTRIES,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            thumbnail_cache_bytes: DEFAULT_THUMBNAIL_CACHE_BYTES,
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// One deck, its caches and its viewer sessions.
///
/// # Type Parameters
///
/// * `F` - The asset fetcher (HTTP in production, in-memory in tests)
pub struct DeckService<F: AssetFetcher> {
    request: ResolveRequest,
    resolver: SlideResolver<F>,
    thumbnails: Arc<ThumbnailService<F>>,
    sessions: SessionStore<F>,
    options: DeckOptions,
}

impl<F: AssetFetcher + 'static> DeckService<F> {
    /// Create a service with default options.
    pub fn new(fetcher: Arc<F>, request: ResolveRequest) -> Self {
        Self::with_options(fetcher, request, DeckOptions::default())
    }

    pub fn with_options(fetcher: Arc<F>, request: ResolveRequest, options: DeckOptions) -> Self {
        let prober = Arc::new(ExistenceProber::with_ttl(
            Arc::clone(&fetcher),
            options.cache_ttl,
            options.probe_cache_entries,
        ));
        let resolver =
            SlideResolver::with_options(prober, options.cache_ttl, options.probe_concurrency);
        let thumbnails = Arc::new(ThumbnailService::with_options(
            fetcher,
            ThumbnailEncoder::with_quality(options.thumbnail_quality),
            options.cache_ttl,
            options.thumbnail_cache_bytes,
        ));

        Self {
            request,
            resolver,
            thumbnails,
            sessions: SessionStore::with_capacity(options.max_sessions),
            options,
        }
    }

    /// The resolved deck, from cache when fresh.
    pub async fn deck(&self) -> Result<Arc<SlideDeck>, ResolveError> {
        self.resolver.resolve(&self.request).await
    }

    /// Drop the cached deck and resolve again.
    ///
    /// Probe results are still reused until they expire.
    pub async fn refresh(&self) -> Result<Arc<SlideDeck>, ResolveError> {
        self.resolver.invalidate(&self.request).await;
        self.deck().await
    }

    /// Thumbnail of the slide at 0-based `position`.
    ///
    /// `width` defaults to the configured thumbnail width.
    pub async fn thumbnail_at(
        &self,
        position: usize,
        width: Option<u32>,
    ) -> Result<ThumbnailResponse, ThumbnailError> {
        let deck = self.deck().await?;
        let slide = deck.get(position).ok_or(ThumbnailError::SlideNotFound {
            position,
            count: deck.len(),
        })?;

        let width = width.unwrap_or(self.options.thumbnail_width);
        self.thumbnails.get_thumbnail(&slide.url, width).await
    }

    /// Open a session on the current deck.
    pub async fn new_session(&self) -> Result<Session<F>, SessionError> {
        let deck = self.deck().await?;
        let session = Session::new(
            self.sessions.next_id(),
            Arc::clone(&deck),
            Arc::clone(&self.thumbnails),
            self.options.page_size,
            self.options.thumbnail_width,
        )
        .ok_or_else(|| ResolveError::EmptyResultSet {
            pattern: self.request.template.pattern(),
            start: self.request.start_slot,
            end: self.request.end_slot,
        })?;

        info!(session = %session.id(), slides = deck.len(), "Session opened");
        self.sessions.insert(session.clone()).await;
        Ok(session)
    }

    pub async fn session(&self, id: SessionId) -> Result<Session<F>, SessionError> {
        self.sessions.get(id).await
    }

    /// Apply a navigation action to a stored session.
    pub async fn update_session<R>(
        &self,
        id: SessionId,
        action: impl FnOnce(&mut Session<F>) -> R,
    ) -> Result<(R, Session<F>), SessionError> {
        self.sessions.update(id, action).await
    }

    pub fn request(&self) -> &ResolveRequest {
        &self.request
    }

    pub fn options(&self) -> &DeckOptions {
        &self.options
    }

    pub fn resolver(&self) -> &SlideResolver<F> {
        &self.resolver
    }

    pub fn thumbnails(&self) -> &Arc<ThumbnailService<F>> {
        &self.thumbnails
    }

    pub fn sessions(&self) -> &SessionStore<F> {
        &self.sessions
    }
}
