//! Viewer navigation state machine.
//!
//! Pure transitions, no I/O. Out-of-range input is ignored: every transition
//! that can reject input returns `false` and leaves the state unchanged.

use std::num::NonZeroUsize;
use std::ops::Range;

use serde::Serialize;

/// Default fit-to-height parameter, in percent of the viewport height.
pub const DEFAULT_FIT_HEIGHT_PERCENT: u32 = 88;

/// Default fixed-width parameter, in pixels.
pub const DEFAULT_FIXED_WIDTH_PX: u32 = 1000;

/// Accepted fit-to-height range.
pub const FIT_HEIGHT_RANGE: (u32, u32) = (60, 95);

/// Accepted fixed-width range.
pub const FIXED_WIDTH_RANGE: (u32, u32) = (700, 1400);

/// Default number of thumbnails on one grid page.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// How the current slide is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale to a percentage of the viewport height
    FitHeight,
    /// Render at a fixed pixel width
    FixedWidth,
}

impl FitMode {
    /// Inclusive bounds of the mode's parameter.
    pub fn param_range(&self) -> (u32, u32) {
        match self {
            FitMode::FitHeight => FIT_HEIGHT_RANGE,
            FitMode::FixedWidth => FIXED_WIDTH_RANGE,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            FitMode::FitHeight => FitMode::FixedWidth,
            FitMode::FixedWidth => FitMode::FitHeight,
        }
    }
}

/// Per-session cursor over a deck.
///
/// Invariants:
/// - `current_index < slide_count`
/// - `1 <= thumbnail_page <= page_count()`
/// - each fit mode remembers its own parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    slide_count: usize,
    page_size: usize,
    current_index: usize,
    thumbnail_page: usize,
    fit_mode: FitMode,
    fit_height_percent: u32,
    fixed_width_px: u32,
}

impl NavigationState {
    /// Initial state: first slide, first page, fit-to-height at 88%.
    pub fn new(slide_count: NonZeroUsize, page_size: NonZeroUsize) -> Self {
        Self {
            slide_count: slide_count.get(),
            page_size: page_size.get(),
            current_index: 0,
            thumbnail_page: 1,
            fit_mode: FitMode::FitHeight,
            fit_height_percent: DEFAULT_FIT_HEIGHT_PERCENT,
            fixed_width_px: DEFAULT_FIXED_WIDTH_PX,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// 0-based index of the current slide.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 1-based thumbnail grid page.
    pub fn thumbnail_page(&self) -> usize {
        self.thumbnail_page
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    /// Parameter of the active fit mode.
    pub fn fit_param(&self) -> u32 {
        self.param_for(self.fit_mode)
    }

    /// Remembered parameter of either mode.
    pub fn param_for(&self, mode: FitMode) -> u32 {
        match mode {
            FitMode::FitHeight => self.fit_height_percent,
            FitMode::FixedWidth => self.fixed_width_px,
        }
    }

    /// Number of thumbnail pages, at least 1.
    pub fn page_count(&self) -> usize {
        self.slide_count.div_ceil(self.page_size).max(1)
    }

    /// Slide indices shown on the current thumbnail page.
    pub fn page_range(&self) -> Range<usize> {
        let start = (self.thumbnail_page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.slide_count);
        start..end
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Advance one slide, wrapping from the last to the first.
    pub fn next(&mut self) {
        self.current_index = (self.current_index + 1) % self.slide_count;
    }

    /// Go back one slide, wrapping from the first to the last.
    pub fn previous(&mut self) {
        self.current_index = (self.current_index + self.slide_count - 1) % self.slide_count;
    }

    pub fn go_first(&mut self) {
        self.current_index = 0;
    }

    /// Jump to the 1-based slide number `n`.
    pub fn jump_to(&mut self, n: usize) -> bool {
        if n == 0 || n > self.slide_count {
            return false;
        }
        self.current_index = n - 1;
        true
    }

    /// Select a slide by 0-based index, as from the thumbnail grid.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slide_count {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Switch to the 1-based thumbnail page `p`.
    ///
    /// Does not move the current slide.
    pub fn set_page(&mut self, p: usize) -> bool {
        if p == 0 || p > self.page_count() {
            return false;
        }
        self.thumbnail_page = p;
        true
    }

    /// Flip between fit-to-height and fixed-width.
    pub fn toggle_fit_mode(&mut self) {
        self.fit_mode = self.fit_mode.toggled();
    }

    /// Set the active mode's parameter, clamped into its range.
    ///
    /// Returns the stored value.
    pub fn set_fit_param(&mut self, value: u32) -> u32 {
        let (min, max) = self.fit_mode.param_range();
        let value = value.clamp(min, max);
        match self.fit_mode {
            FitMode::FitHeight => self.fit_height_percent = value,
            FitMode::FixedWidth => self.fixed_width_px = value,
        }
        value
    }
}
