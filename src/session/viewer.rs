//! Per-user viewing session.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;

use super::navigation::{FitMode, NavigationState};
use crate::discovery::{ResolvedSlide, SlideDeck};
use crate::error::{SessionError, ThumbnailError};
use crate::fetch::AssetFetcher;
use crate::thumbnail::ThumbnailService;

/// Opaque session identifier, rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(SessionId)
            .map_err(|_| SessionError::NotFound(s.to_string()))
    }
}

impl Serialize for SessionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of deriving one thumbnail of a page.
#[derive(Debug, Clone)]
pub struct PageThumbnail {
    pub position: usize,
    pub result: Result<Bytes, ThumbnailError>,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub slide_count: usize,
    /// 1-based number of the current slide
    pub current_number: usize,
    pub current: ResolvedSlide,
    pub caption: String,
    pub fit_mode: FitMode,
    pub fit_param: u32,
    pub thumbnail_page: usize,
    pub page_count: usize,
    pub page_slides: Vec<ResolvedSlide>,
}

/// A viewer's navigation over a shared deck.
///
/// Sessions own their [`NavigationState`]; the deck and the thumbnail
/// service are shared with every other session of the process.
pub struct Session<F: AssetFetcher> {
    id: SessionId,
    deck: Arc<SlideDeck>,
    navigation: NavigationState,
    thumbnails: Arc<ThumbnailService<F>>,
    thumbnail_width: u32,
}

impl<F: AssetFetcher> Clone for Session<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            deck: Arc::clone(&self.deck),
            navigation: self.navigation.clone(),
            thumbnails: Arc::clone(&self.thumbnails),
            thumbnail_width: self.thumbnail_width,
        }
    }
}

impl<F: AssetFetcher + 'static> Session<F> {
    /// Start a session on the first slide of `deck`.
    ///
    /// Returns `None` for an empty deck.
    pub fn new(
        id: SessionId,
        deck: Arc<SlideDeck>,
        thumbnails: Arc<ThumbnailService<F>>,
        page_size: NonZeroUsize,
        thumbnail_width: u32,
    ) -> Option<Self> {
        let count = NonZeroUsize::new(deck.len())?;
        Some(Self {
            id,
            deck,
            navigation: NavigationState::new(count, page_size),
            thumbnails,
            thumbnail_width,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn deck(&self) -> &Arc<SlideDeck> {
        &self.deck
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationState {
        &mut self.navigation
    }

    pub fn current_slide(&self) -> &ResolvedSlide {
        // current_index < deck.len() is upheld by NavigationState
        &self.deck.slides()[self.navigation.current_index()]
    }

    /// `Slide 3 / 20 · F25_Ch01.003.png`
    pub fn caption(&self) -> String {
        format!(
            "Slide {} / {} · {}",
            self.navigation.current_index() + 1,
            self.deck.len(),
            self.current_slide().display_name
        )
    }

    /// Slides on the current thumbnail page.
    pub fn page_slides(&self) -> &[ResolvedSlide] {
        &self.deck.slides()[self.navigation.page_range()]
    }

    /// Derive the thumbnails of the current page concurrently.
    ///
    /// Each entry carries its own result; one failure never affects the
    /// others. Entries are returned in page order.
    pub async fn page_thumbnails(&self) -> Vec<PageThumbnail> {
        let mut tasks = JoinSet::new();
        for slide in self.page_slides() {
            let service = Arc::clone(&self.thumbnails);
            let url = slide.url.clone();
            let position = slide.position;
            let width = self.thumbnail_width;
            tasks.spawn(async move {
                let result = service.get_thumbnail(&url, width).await.map(|r| r.data);
                PageThumbnail { position, result }
            });
        }

        let mut thumbnails = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(thumbnail) => thumbnails.push(thumbnail),
                Err(e) => warn!(error = %e, "Thumbnail task failed"),
            }
        }
        thumbnails.sort_by_key(|t| t.position);
        thumbnails
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            slide_count: self.deck.len(),
            current_number: self.navigation.current_index() + 1,
            current: self.current_slide().clone(),
            caption: self.caption(),
            fit_mode: self.navigation.fit_mode(),
            fit_param: self.navigation.fit_param(),
            thumbnail_page: self.navigation.thumbnail_page(),
            page_count: self.navigation.page_count(),
            page_slides: self.page_slides().to_vec(),
        }
    }
}
