//! Slide discovery layer.
//!
//! Turns a filename template and a slot range into an ordered deck of
//! slides that actually exist on the remote host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             SlideResolver               │
//! │  (slot fan-out, suffix priority,        │
//! │   deck-level result cache)              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ExistenceProber              │
//! │  (per-URL TTL cache, failure = missing) │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           AssetFetcher Trait            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`SlideTemplate`]: Builds `{root}/{prefix}{slot:03}{suffix}{ext}` URLs
//! - [`SuffixVariant`] / [`SuffixOrder`]: Suffixes tried per slot, in priority order
//! - [`ExistenceProber`]: Memoized "does this URL exist?" checks
//! - [`SlideResolver`]: Produces a dense, slot-ordered [`SlideDeck`]
//!
//! # Example
//!
//! ```ignore
//! use deck_streamer::discovery::{
//!     ExistenceProber, ResolveRequest, SlideResolver, SlideTemplate, SuffixOrder,
//! };
//!
//! let template = SlideTemplate::new("https://host/deck", "260112.", ".png")?;
//! let order = SuffixOrder::parse(&["a", ""])?;
//! let request = ResolveRequest::new(template, 1, 120, order)?;
//!
//! let prober = Arc::new(ExistenceProber::new(fetcher));
//! let resolver = SlideResolver::new(prober);
//! let deck = resolver.resolve(&request).await?;
//! ```

mod prober;
mod resolver;
mod suffix;
mod template;

pub use prober::ExistenceProber;
pub use resolver::{
    ResolveRequest, ResolvedSlide, SlideDeck, SlideResolver, DEFAULT_PROBE_CONCURRENCY,
    MAX_SLOT_COUNT,
};
pub use suffix::{SuffixOrder, SuffixVariant};
pub use template::{github_raw_root, Candidate, SlideTemplate, GITHUB_RAW_HOST};
