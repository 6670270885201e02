//! Configuration management for Deck Streamer.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `DECK_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use deck_streamer::config::{Cli, Command};
//! use clap::Parser;
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Resolve(config) => println!("Resolving {:?}", config.deck.end_slot),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `DECK_ASSET_ROOT` - Base URL the slide images live under
//! - `DECK_GITHUB_OWNER` / `DECK_GITHUB_REPO` / `DECK_GITHUB_BRANCH` / `DECK_GITHUB_FOLDER` -
//!   GitHub raw addressing, instead of an asset root
//! - `DECK_PREFIX` - File name prefix before the slot number
//! - `DECK_EXTENSION` - File extension (default: .png)
//! - `DECK_START_SLOT` / `DECK_END_SLOT` - Inclusive slot range
//! - `DECK_SUFFIX_ORDER` - Comma-separated suffix priority (default: bare only)
//! - `DECK_PROBE_TIMEOUT` - Seconds before a probe counts as missing (default: 8)
//! - `DECK_CACHE_TTL` - Seconds cached probes, decks and thumbnails stay valid (default: 3600)
//! - `DECK_HOST` / `DECK_PORT` - Server bind address (default: 0.0.0.0:3000)
//! - `DECK_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)

use std::num::NonZeroUsize;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::discovery::{
    ResolveRequest, SlideTemplate, SuffixOrder, DEFAULT_PROBE_CONCURRENCY, MAX_SLOT_COUNT,
};
use crate::service::DeckOptions;
use crate::session::{DEFAULT_MAX_SESSIONS, DEFAULT_PAGE_SIZE};
use crate::thumbnail::{
    DEFAULT_THUMBNAIL_CACHE_BYTES, DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_WIDTH,
    MAX_THUMBNAIL_WIDTH,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Default probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 8;

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default GitHub branch.
pub const DEFAULT_GITHUB_BRANCH: &str = "main";

/// Default slide file extension.
pub const DEFAULT_EXTENSION: &str = ".png";

// =============================================================================
// CLI
// =============================================================================

/// Deck Streamer - discovers numbered slide images on a remote host and
/// serves the deck, thumbnails and viewer sessions over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "deck-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Run one resolution pass and print the slide list.
    Resolve(ResolveConfig),
}

// =============================================================================
// Deck Options
// =============================================================================

/// Where the deck lives and how it is cached. Shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DeckArgs {
    // =========================================================================
    // Addressing
    // =========================================================================
    /// Base URL the slide images live under.
    #[arg(long, env = "DECK_ASSET_ROOT")]
    pub asset_root: Option<String>,

    /// GitHub user or organisation hosting the slides.
    #[arg(long, env = "DECK_GITHUB_OWNER")]
    pub github_owner: Option<String>,

    /// GitHub repository hosting the slides.
    #[arg(long, env = "DECK_GITHUB_REPO")]
    pub github_repo: Option<String>,

    /// GitHub branch.
    #[arg(long, default_value = DEFAULT_GITHUB_BRANCH, env = "DECK_GITHUB_BRANCH")]
    pub github_branch: String,

    /// Folder inside the GitHub repository.
    #[arg(long, default_value = "", env = "DECK_GITHUB_FOLDER")]
    pub github_folder: String,

    /// File name prefix before the zero-padded slot number, e.g. `F25_Ch01.`.
    #[arg(long, default_value = "", env = "DECK_PREFIX")]
    pub prefix: String,

    /// File extension including the dot.
    #[arg(long, default_value = DEFAULT_EXTENSION, env = "DECK_EXTENSION")]
    pub extension: String,

    // =========================================================================
    // Resolution
    // =========================================================================
    /// First slot number to probe.
    #[arg(long, default_value_t = 1, env = "DECK_START_SLOT")]
    pub start_slot: u32,

    /// Last slot number to probe (inclusive). At most 10000 slots per deck.
    #[arg(long, env = "DECK_END_SLOT")]
    pub end_slot: u32,

    /// Suffixes to try per slot, highest priority first (comma-separated).
    ///
    /// An empty item or `none` stands for the bare file name, e.g. `a,none`.
    #[arg(long, env = "DECK_SUFFIX_ORDER", value_delimiter = ',')]
    pub suffix_order: Vec<String>,

    /// Seconds before an existence probe gives up and counts as missing.
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS, env = "DECK_PROBE_TIMEOUT")]
    pub probe_timeout: u64,

    /// Number of slots probed concurrently.
    #[arg(long, default_value_t = DEFAULT_PROBE_CONCURRENCY, env = "DECK_PROBE_CONCURRENCY")]
    pub probe_concurrency: usize,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Seconds probe results, decks and thumbnails stay valid.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "DECK_CACHE_TTL")]
    pub cache_ttl: u64,

    /// Maximum number of probed URLs to remember.
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES, env = "DECK_CACHE_PROBES")]
    pub cache_probes: usize,

    /// Maximum size of the thumbnail cache in bytes.
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_CACHE_BYTES, env = "DECK_CACHE_THUMBNAILS")]
    pub cache_thumbnails: usize,

    // =========================================================================
    // Thumbnail Configuration
    // =========================================================================
    /// Default maximum thumbnail width in pixels.
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_WIDTH, env = "DECK_THUMBNAIL_WIDTH")]
    pub thumbnail_width: u32,

    /// JPEG quality of thumbnails (1-100).
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_QUALITY, env = "DECK_THUMBNAIL_QUALITY")]
    pub thumbnail_quality: u8,

    /// Thumbnails per grid page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, env = "DECK_THUMBNAILS_PER_PAGE")]
    pub thumbnails_per_page: usize,
}

impl DeckArgs {
    /// Validate the deck options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.template()?;
        self.suffix_order()?;

        if self.start_slot > self.end_slot {
            return Err(format!(
                "start_slot ({}) must not be greater than end_slot ({})",
                self.start_slot, self.end_slot
            ));
        }
        if self.end_slot - self.start_slot >= MAX_SLOT_COUNT {
            return Err(format!(
                "slot range {}-{} is too wide: at most {} slots per deck",
                self.start_slot, self.end_slot, MAX_SLOT_COUNT
            ));
        }

        if self.probe_timeout == 0 {
            return Err("probe_timeout must be greater than 0".to_string());
        }
        if self.probe_concurrency == 0 {
            return Err("probe_concurrency must be greater than 0".to_string());
        }
        if self.cache_probes == 0 {
            return Err("cache_probes must be greater than 0".to_string());
        }
        if self.cache_thumbnails == 0 {
            return Err("cache_thumbnails must be greater than 0".to_string());
        }
        if self.thumbnails_per_page == 0 {
            return Err("thumbnails_per_page must be greater than 0".to_string());
        }

        if self.thumbnail_width == 0 || self.thumbnail_width > MAX_THUMBNAIL_WIDTH {
            return Err(format!(
                "thumbnail_width must be between 1 and {}",
                MAX_THUMBNAIL_WIDTH
            ));
        }

        if self.thumbnail_quality == 0 || self.thumbnail_quality > 100 {
            return Err("thumbnail_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Build the filename template from either the asset root or the GitHub
    /// options. Exactly one of the two must be given.
    pub fn template(&self) -> Result<SlideTemplate, String> {
        let github = self.github_owner.is_some() || self.github_repo.is_some();

        match (&self.asset_root, github) {
            (Some(_), true) => Err(
                "Both --asset-root and --github-owner/--github-repo are set; use one or the other"
                    .to_string(),
            ),
            (Some(root), false) => SlideTemplate::new(root, &self.prefix, &self.extension)
                .map_err(|e| e.to_string()),
            (None, true) => match (&self.github_owner, &self.github_repo) {
                (Some(owner), Some(repo)) => SlideTemplate::github_raw(
                    owner,
                    repo,
                    &self.github_branch,
                    &self.github_folder,
                    &self.prefix,
                    &self.extension,
                )
                .map_err(|e| e.to_string()),
                _ => Err("GitHub addressing needs both --github-owner and --github-repo".to_string()),
            },
            (None, false) => Err(
                "No slide location given. Set --asset-root (DECK_ASSET_ROOT) \
                 or --github-owner and --github-repo"
                    .to_string(),
            ),
        }
    }

    pub fn suffix_order(&self) -> Result<SuffixOrder, String> {
        SuffixOrder::parse(&self.suffix_order).map_err(|e| e.to_string())
    }

    /// The resolution request these options describe.
    pub fn resolve_request(&self) -> Result<ResolveRequest, String> {
        ResolveRequest::new(
            self.template()?,
            self.start_slot,
            self.end_slot,
            self.suffix_order()?,
        )
        .map_err(|e| e.to_string())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Service options, with `max_sessions` live sessions.
    pub fn deck_options(&self, max_sessions: usize) -> DeckOptions {
        DeckOptions {
            cache_ttl: self.cache_ttl(),
            probe_cache_entries: self.cache_probes,
            probe_concurrency: self.probe_concurrency,
            thumbnail_width: self.thumbnail_width,
            thumbnail_quality: self.thumbnail_quality,
            thumbnail_cache_bytes: self.cache_thumbnails,
            page_size: NonZeroUsize::new(self.thumbnails_per_page).unwrap_or(NonZeroUsize::MIN),
            max_sessions,
        }
    }
}

// =============================================================================
// Serve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[command(flatten)]
    pub deck: DeckArgs,

    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DECK_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DECK_PORT")]
    pub port: u16,

    /// Maximum number of viewer sessions kept in memory.
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS, env = "DECK_CACHE_SESSIONS")]
    pub cache_sessions: usize,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "DECK_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DECK_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.deck.validate()?;

        if self.cache_sessions == 0 {
            return Err("cache_sessions must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn deck_options(&self) -> DeckOptions {
        self.deck.deck_options(self.cache_sessions)
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ResolveConfig {
    #[command(flatten)]
    pub deck: DeckArgs,

    /// Also derive the first page of thumbnails and report their sizes.
    #[arg(long, default_value_t = false)]
    pub thumbnails: bool,

    /// Print the deck as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ResolveConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.deck.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
