//! Error types for the hls-stitch application.

use thiserror::Error;

/// Errors raised while resolving a manifest URL to a media playlist.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest unreachable: {0}")]
    Unreachable(#[from] FetchError),

    #[error("failed to parse manifest: {0}")]
    ParseFailure(String),

    #[error("master playlist declares no variants")]
    NoVariants,

    #[error("media playlist declares no segments")]
    NoSegments,

    #[error("selected variant points to another master playlist (nested variants are not supported)")]
    NestedVariant,
}

/// Errors raised by a single HTTP fetch.
///
/// Cloneable so a failed segment's cause can be recorded in its
/// `SegmentFailure` and still appear in log output.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Network(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("failed to write segment: {0}")]
    Write(String),

    #[error("cancelled")]
    Cancelled,
}

/// Errors raised while concatenating fetched segments into one file.
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("no segments to assemble")]
    EmptyInput,

    #[error("concat tool failed ({status}): {stderr}")]
    ToolFailure { status: String, stderr: String },

    #[error("ffmpeg not found. Please install ffmpeg and ensure it's in your PATH.")]
    ToolNotFound,

    #[error("IO error during assembly: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Pipeline stage errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_URLS_FAILED: i32 = 6;
}
