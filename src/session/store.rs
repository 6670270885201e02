//! Bounded in-memory session store.
//!
//! Sessions live in an LRU; the least recently touched session is dropped
//! when the store is full. A dropped session is simply gone; the client
//! opens a new one.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use super::viewer::{Session, SessionId};
use crate::error::SessionError;
use crate::fetch::AssetFetcher;

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

pub struct SessionStore<F: AssetFetcher> {
    sessions: Mutex<LruCache<SessionId, Session<F>>>,
    next_id: AtomicU64,
}

impl<F: AssetFetcher + 'static> SessionStore<F> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Reserve a fresh session id.
    pub fn next_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Store a session, evicting the least recently used one if full.
    pub async fn insert(&self, session: Session<F>) {
        let mut sessions = self.sessions.lock().await;
        if let Some((evicted, _)) = sessions.push(session.id(), session) {
            debug!(session = %evicted, "Session evicted");
        }
    }

    /// Copy of the session with `id`.
    pub async fn get(&self, id: SessionId) -> Result<Session<F>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Apply `action` to the stored session and return it afterwards.
    pub async fn update<R>(
        &self,
        id: SessionId,
        action: impl FnOnce(&mut Session<F>) -> R,
    ) -> Result<(R, Session<F>), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let outcome = action(session);
        Ok((outcome, session.clone()))
    }

    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.lock().await.pop(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl<F: AssetFetcher + 'static> Default for SessionStore<F> {
    fn default() -> Self {
        Self::new()
    }
}
