//! Error types for image fetching.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::cache::KeyError;

/// Errors that can occur while fetching an image into the cache.
///
/// Every variant is terminal for the URL being fetched. Only "not found"
/// responses are retried, and exhausting those retries yields
/// [`FetchError::MaxAttemptsExceeded`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The image URL could not be turned into a cache key.
    #[error(transparent)]
    InvalidUrl(#[from] KeyError),

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// DNS, connect, timeout or body read failure.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Non-success status other than 404.
    #[error("HTTP {status} from {url}")]
    BadStatus { url: String, status: StatusCode },

    /// Every attempt was answered with 404.
    #[error("max attempts exceeded for {url}: {attempts} attempts answered not found")]
    MaxAttemptsExceeded { url: String, attempts: u32 },

    /// The body is not an image of the expected encoding.
    #[error("invalid content type from {url}: expected {expected}, detected {detected}")]
    InvalidContentType {
        url: String,
        expected: &'static str,
        detected: String,
    },

    /// The fetch was cancelled before it completed.
    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },

    /// Cache filesystem error.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Returns true for errors caused by cancellation rather than failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
