//! Content addressing for cached images.
//!
//! Every image URL maps to a stable file name: the lowercase hex SHA-256 of
//! the raw URL string, followed by the extension of the URL path (if any).
//! The same URL always yields the same key, byte-for-byte, across runs.

use std::fmt;

use reqwest::Url;
use sha2::{Digest, Sha256};
use thiserror::Error;

const DIGEST_HEX_LEN: usize = 64;

/// Errors that can occur while deriving a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The source could not be parsed as an absolute URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A content-addressed cache key.
///
/// Used both as an in-memory lookup key and as a file name inside the cache
/// directory, so it never contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the extension carried by the key, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        // The digest is pure hex, so any dot was appended from the URL path.
        self.0.find('.').map(|i| &self.0[i + 1..])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for an image URL.
///
/// # Errors
///
/// Returns [`KeyError::InvalidUrl`] if `url` is not an absolute URL.
///
/// # Example
///
/// ```
/// use iconsheet::cache::derive_key;
///
/// let key = derive_key("https://example.com/icons/a.png").unwrap();
/// assert!(key.as_str().ends_with(".png"));
/// assert_eq!(key, derive_key("https://example.com/icons/a.png").unwrap());
/// ```
pub fn derive_key(url: &str) -> Result<CacheKey, KeyError> {
    let parsed = Url::parse(url).map_err(|e| KeyError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut name = format!("{:x}", Sha256::digest(url.as_bytes()));
    if let Some(ext) = path_extension(parsed.path()) {
        name.push_str(ext);
    }

    Ok(CacheKey(name))
}

/// Whether `name` has the shape of a key produced by [`derive_key`].
///
/// Temp files from interrupted writes and anything else sharing the
/// directory fail this check.
pub(crate) fn is_key_name(name: &str) -> bool {
    let (digest, rest) = match name.get(..DIGEST_HEX_LEN) {
        Some(digest) => (digest, &name[DIGEST_HEX_LEN..]),
        None => return false,
    };
    digest
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        && (rest.is_empty() || rest.starts_with('.'))
}

/// Extension of the final path segment, including the leading dot.
fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rfind('.').map(|i| &segment[i..])
}
