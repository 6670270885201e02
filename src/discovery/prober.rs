//! Memoized existence checks.
//!
//! Every failure mode (non-200 status, timeout, transport error) collapses
//! into "does not exist". This loses precision: a slow but present asset is
//! reported missing until its cached answer expires.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{TtlCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::fetch::AssetFetcher;

/// Answers "does this URL exist?" with a per-URL TTL cache.
pub struct ExistenceProber<F: AssetFetcher> {
    fetcher: Arc<F>,
    cache: TtlCache<String, bool>,
}

impl<F: AssetFetcher> ExistenceProber<F> {
    /// Create a prober with the default TTL (1 hour) and capacity.
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_cache(fetcher, TtlCache::with_capacity(DEFAULT_TTL, DEFAULT_MAX_ENTRIES))
    }

    /// Create a prober backed by an explicitly configured cache.
    pub fn with_cache(fetcher: Arc<F>, cache: TtlCache<String, bool>) -> Self {
        Self { fetcher, cache }
    }

    /// Create a prober with a custom TTL and number of remembered URLs.
    pub fn with_ttl(fetcher: Arc<F>, ttl: Duration, capacity: usize) -> Self {
        Self::with_cache(fetcher, TtlCache::with_capacity(ttl, capacity))
    }

    /// Whether `url` exists on the remote host.
    ///
    /// Never fails. Results, negative ones included, are remembered for the
    /// cache TTL keyed on the exact URL string.
    pub async fn exists(&self, url: &str) -> bool {
        let result = self
            .cache
            .get_or_compute(url.to_string(), move || async move {
                let exists = match self.fetcher.check(url).await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(url = url, error = %e, "Probe miss");
                        false
                    }
                };
                Ok::<_, Infallible>(exists)
            })
            .await;

        match result {
            Ok(exists) => exists,
            Err(never) => match never {},
        }
    }

    /// Forget the cached answer for `url`.
    pub async fn invalidate(&self, url: &str) {
        self.cache.invalidate(&url.to_string()).await;
    }

    /// Forget every cached answer.
    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    /// Number of URLs with a remembered answer.
    pub async fn cached_count(&self) -> usize {
        self.cache.len().await
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }
}
