//! Custom error types and result handling for ebooktools operations.
//!
//! All fallible operations return a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Most failures of external tools never reach
//! the caller: the ISBN search pipeline absorbs them and moves on to the next
//! strategy. What surfaces here is configuration mistakes, unexpected
//! filesystem failures and errors of the standalone helpers.

use std::path::PathBuf;

/// Type alias for Results with ebooktools errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all ebooktools operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// ZIP archive errors from in-process extraction
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Blocking task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::ebooktools::EbookToolsConfigBuilderError),
    /// Configuration file could not be parsed
    #[error(transparent)]
    ConfigParse(#[from] toml::de::Error),
    /// Configuration file could not be rendered
    #[error(transparent)]
    ConfigRender(#[from] toml::ser::Error),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// An external program is not installed or could not be spawned
    #[error("Tool is not available: {0}")]
    ToolUnavailable(String),
    /// An external program ran but reported a failure
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
    /// An external program produced output that could not be interpreted
    #[error("Unexpected output from '{tool}': {output:?}")]
    InvalidToolOutput { tool: String, output: String },
    /// The configured OCR backend identifier is not one of the known backends
    #[error("Unknown OCR backend: {0}")]
    UnknownOcrBackend(String),
    /// Error for unsupported operations or formats
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found
    #[error("Not found: {0}")]
    NotFound(String),
}
