//! Viewer sessions.
//!
//! A [`Session`] is the explicit per-user context: it owns a
//! [`NavigationState`] and holds shared handles to the resolved deck and the
//! process-wide thumbnail service. Nothing in the caching layers ever
//! touches navigation state.
//!
//! - [`NavigationState`]: pure cursor / paging / fit-mode transitions
//! - [`Session`]: navigation plus deck access and page thumbnails
//! - [`SessionStore`]: LRU-bounded map from [`SessionId`] to session

mod navigation;
mod store;
mod viewer;

pub use navigation::{
    FitMode, NavigationState, DEFAULT_FIT_HEIGHT_PERCENT, DEFAULT_FIXED_WIDTH_PX, DEFAULT_PAGE_SIZE,
    FIT_HEIGHT_RANGE, FIXED_WIDTH_RANGE,
};
pub use store::{SessionStore, DEFAULT_MAX_SESSIONS};
pub use viewer::{PageThumbnail, Session, SessionId, SessionSnapshot};
