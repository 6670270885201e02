//! Slide resolution.
//!
//! A resolution pass walks every slot in `[start_slot, end_slot]`, tries the
//! configured suffix variants in priority order and keeps the first one that
//! exists. Slots probe concurrently; the output is re-sorted by slot before
//! it is returned, so probing order never leaks into the deck.
//!
//! ```text
//! slots 1..=5, suffixes [a, none]
//!
//!   1 ─▶ 001a? no ─▶ 001? yes ──▶ position 0
//!   2 ─▶ 002a? yes ─────────────▶ position 1
//!   3 ─▶ 003a? no ─▶ 003? no ───▶ (dropped)
//!   4 ─▶ 004a? no ─▶ 004? yes ──▶ position 2
//!   5 ─▶ 005a? no ─▶ 005? yes ──▶ position 3
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::prober::ExistenceProber;
use super::suffix::{SuffixOrder, SuffixVariant};
use super::template::{Candidate, SlideTemplate};
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::error::ResolveError;
use crate::fetch::AssetFetcher;

/// Default number of slots probed at the same time.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// Widest slot range a single request may cover.
pub const MAX_SLOT_COUNT: u32 = 10_000;

/// Number of distinct resolution requests remembered.
const RESOLUTION_CACHE_CAPACITY: usize = 64;

// =============================================================================
// Request
// =============================================================================

/// Everything that determines the outcome of a resolution pass.
///
/// Also the key of the resolution cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolveRequest {
    pub template: SlideTemplate,
    pub start_slot: u32,
    pub end_slot: u32,
    pub suffix_order: SuffixOrder,
}

impl ResolveRequest {
    pub fn new(
        template: SlideTemplate,
        start_slot: u32,
        end_slot: u32,
        suffix_order: SuffixOrder,
    ) -> Result<Self, ResolveError> {
        if start_slot > end_slot {
            return Err(ResolveError::InvalidRange {
                start: start_slot,
                end: end_slot,
            });
        }
        if end_slot - start_slot >= MAX_SLOT_COUNT {
            return Err(ResolveError::RangeTooWide {
                start: start_slot,
                end: end_slot,
                max: MAX_SLOT_COUNT,
            });
        }
        if suffix_order.is_empty() {
            return Err(ResolveError::EmptySuffixOrder);
        }

        Ok(Self {
            template,
            start_slot,
            end_slot,
            suffix_order,
        })
    }

    /// Number of slots in the nominal range.
    pub fn slot_count(&self) -> usize {
        (self.end_slot - self.start_slot) as usize + 1
    }

    /// Candidates for one slot, in the order they must be tried.
    pub fn candidates(&self, slot: u32) -> Vec<Candidate> {
        self.suffix_order
            .variants()
            .iter()
            .map(|&suffix| self.template.candidate(slot, suffix))
            .collect()
    }
}

// =============================================================================
// Resolved Deck
// =============================================================================

/// One slide of a resolved deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSlide {
    /// 0-based index in the deck
    pub position: usize,

    /// Remote URL of the full-resolution image
    pub url: String,

    /// File name shown to users, e.g. `260112.013a.png`
    pub display_name: String,

    /// Slot number the slide was found at
    pub slot: u32,

    /// Suffix variant that resolved
    pub suffix: SuffixVariant,
}

/// Ordered, dense list of slides produced by a resolution pass.
///
/// Positions run `0..len()` without holes; missing slots are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideDeck {
    slides: Vec<ResolvedSlide>,
}

impl SlideDeck {
    /// Build a deck from candidates, sorting them by slot and numbering
    /// positions densely.
    pub(crate) fn from_candidates(mut found: Vec<Candidate>) -> Self {
        found.sort_by_key(|c| c.slot);
        found.dedup_by_key(|c| c.slot);

        let slides = found
            .into_iter()
            .enumerate()
            .map(|(position, c)| ResolvedSlide {
                position,
                url: c.url,
                display_name: c.file_name,
                slot: c.slot,
                suffix: c.suffix,
            })
            .collect();

        Self { slides }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ResolvedSlide> {
        self.slides.get(position)
    }

    pub fn slides(&self) -> &[ResolvedSlide] {
        &self.slides
    }

    /// URLs in deck order.
    pub fn urls(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.url.as_str()).collect()
    }

    /// Display names in deck order.
    pub fn names(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.display_name.as_str()).collect()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Produces [`SlideDeck`]s by probing slot candidates.
///
/// Whole results are cached per [`ResolveRequest`] for the same TTL as the
/// probes they are built from. Failed passes are not cached, so an
/// `EmptyResultSet` can be retried at any time.
pub struct SlideResolver<F: AssetFetcher> {
    prober: Arc<ExistenceProber<F>>,
    cache: TtlCache<ResolveRequest, Arc<SlideDeck>>,
    concurrency: usize,
}

impl<F: AssetFetcher + 'static> SlideResolver<F> {
    /// Create a resolver with default TTL and concurrency.
    pub fn new(prober: Arc<ExistenceProber<F>>) -> Self {
        Self::with_options(prober, DEFAULT_TTL, DEFAULT_PROBE_CONCURRENCY)
    }

    /// Create a resolver with a custom result TTL and probe fan-out.
    ///
    /// A concurrency of 1 probes slots strictly one after another.
    pub fn with_options(prober: Arc<ExistenceProber<F>>, ttl: Duration, concurrency: usize) -> Self {
        Self {
            prober,
            cache: TtlCache::with_capacity(ttl, RESOLUTION_CACHE_CAPACITY),
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve the deck described by `request`, using the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::EmptyResultSet`] when no slot resolves.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Arc<SlideDeck>, ResolveError> {
        self.cache
            .get_or_compute(request.clone(), move || self.resolve_uncached(request))
            .await
    }

    /// Run a full resolution pass, bypassing the result cache.
    ///
    /// Individual probes still go through the prober's cache.
    pub async fn resolve_uncached(
        &self,
        request: &ResolveRequest,
    ) -> Result<Arc<SlideDeck>, ResolveError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for slot in request.start_slot..=request.end_slot {
            // At most `concurrency` slot tasks exist at any time
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let prober = Arc::clone(&self.prober);
            let candidates = request.candidates(slot);

            tasks.spawn(async move {
                let _permit = permit;
                for candidate in candidates {
                    if prober.exists(&candidate.url).await {
                        return Some(candidate);
                    }
                }
                debug!(slot = slot, "Slot unresolved");
                None
            });
        }

        let mut found = Vec::with_capacity(request.slot_count());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(candidate)) => found.push(candidate),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Probe task failed, slot skipped"),
            }
        }

        let deck = SlideDeck::from_candidates(found);

        if deck.is_empty() {
            warn!(
                pattern = %request.template.pattern(),
                start = request.start_slot,
                end = request.end_slot,
                "No slides resolved"
            );
            return Err(ResolveError::EmptyResultSet {
                pattern: request.template.pattern(),
                start: request.start_slot,
                end: request.end_slot,
            });
        }

        info!(
            pattern = %request.template.pattern(),
            resolved = deck.len(),
            slots = request.slot_count(),
            "Resolved slide deck"
        );

        Ok(Arc::new(deck))
    }

    /// Drop the cached result for `request`.
    pub async fn invalidate(&self, request: &ResolveRequest) {
        self.cache.invalidate(request).await;
    }

    pub fn prober(&self) -> &Arc<ExistenceProber<F>> {
        &self.prober
    }
}

// =============================================================================
// Tests
// =============================================================================
