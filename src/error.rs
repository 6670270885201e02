use thiserror::Error;

/// Errors that can occur when talking to the remote asset host
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The URL could not be turned into a request
    #[error("Invalid asset URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// The host answered with a status other than the expected one
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Errors raised while building slide addresses
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// The asset root is not an absolute http(s) URL
    #[error("Invalid asset root '{root}': {message}")]
    InvalidRoot { root: String, message: String },

    /// A suffix variant could not be parsed
    #[error("Invalid suffix '{0}': expected an empty string, 'none', or a single lowercase letter")]
    InvalidSuffix(String),
}

/// Errors that can occur during a resolution pass
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The slot range is inverted
    #[error("Invalid slot range: start {start} is greater than end {end}")]
    InvalidRange { start: u32, end: u32 },

    /// The slot range spans more slots than one pass may probe
    #[error("Slot range {start}-{end} is too wide: at most {max} slots per deck")]
    RangeTooWide { start: u32, end: u32, max: u32 },

    /// No suffix variants were supplied
    #[error("Suffix order must contain at least one variant")]
    EmptySuffixOrder,

    /// Not a single slot resolved to an existing asset
    #[error("No slides found for {pattern} in slots {start}-{end}")]
    EmptyResultSet { pattern: String, start: u32, end: u32 },
}

/// Errors that can occur while deriving a thumbnail
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    /// Fetching the full-resolution image failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The fetched bytes are not a decodable image
    #[error("Failed to decode image: {message}")]
    DecodeError { message: String },

    /// Encoding the thumbnail failed
    #[error("Failed to encode thumbnail: {message}")]
    EncodeError { message: String },

    /// Requested width is not usable
    #[error("Invalid thumbnail width: {width}")]
    InvalidWidth { width: u32 },

    /// No slide at the requested position
    #[error("Slide not found at position {position} (deck has {count} slides)")]
    SlideNotFound { position: usize, count: usize },

    /// The deck the position refers to could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors related to viewer sessions
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Session id is unknown or has been evicted
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Sessions cannot be opened without a resolved deck
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
