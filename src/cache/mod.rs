//! Memoization layer shared by the prober, the resolver and the thumbnail
//! service.
//!
//! All three caches are instances of [`TtlCache`]: an LRU bounded by entry
//! count and total weight whose entries expire after a fixed TTL, with
//! single-flight [`TtlCache::get_or_compute`] and explicit
//! [`TtlCache::invalidate`].

mod ttl_cache;

pub use ttl_cache::{TtlCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
