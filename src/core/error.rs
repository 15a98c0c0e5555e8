//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vsixfetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or downloading extensions.
#[derive(Debug, Error)]
pub enum Error {
    /// Extension identifier is not in `publisher.package` form.
    #[error("Invalid extension identifier '{0}': expected publisher.package")]
    InvalidExtensionId(String),

    /// Transport-level failure talking to the gallery.
    #[error("Network error: {0}")]
    Network(String),

    /// The gallery answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The published version list could not be obtained.
    #[error("Could not list versions of '{extension}': {reason}")]
    VersionList { extension: String, reason: String },

    /// Package archive could not be opened or read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Package manifest is missing or malformed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Listing installed extensions failed.
    #[error("Failed to list installed extensions: {0}")]
    ListCommand(String),

    /// Results cache could not be read or written.
    #[error("Cache error at {path}: {reason}")]
    Cache { path: PathBuf, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn cache(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Cache { path: path.into(), reason: reason.to_string() }
    }
}
