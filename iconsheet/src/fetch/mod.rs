//! Image fetching into the content-addressed cache.
//!
//! # Retry semantics
//!
//! The image host occasionally answers `404 Not Found` for images that do
//! exist, so a 404 is treated as transient and retried up to
//! [`FetchPolicy::max_attempts`] times. Every other failure is fatal for the
//! URL on the first occurrence:
//!
//! | Outcome                      | Result                                  |
//! |------------------------------|-----------------------------------------|
//! | 2xx, JPEG body               | cached, path returned                   |
//! | 2xx, other body              | [`FetchError::InvalidContentType`]      |
//! | 404                          | retry, then [`FetchError::MaxAttemptsExceeded`] |
//! | other non-2xx                | [`FetchError::BadStatus`]               |
//! | no response                  | [`FetchError::Transport`]               |
//!
//! # Example
//!
//! ```ignore
//! use iconsheet::cache::ImageCache;
//! use iconsheet::fetch::{FetchPolicy, ImageFetcher, ReqwestClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let fetcher = ImageFetcher::new(
//!     ReqwestClient::new()?,
//!     ImageCache::new("icons"),
//!     FetchPolicy::default(),
//! );
//! let image = fetcher
//!     .fetch_and_cache("https://example.com/a.jpg", &CancellationToken::new())
//!     .await?;
//! println!("cached at {}", image.path.display());
//! ```

mod error;
mod fetcher;
mod http;

pub use error::FetchError;
pub use fetcher::{
    validate_content, CacheOrigin, CachedImage, FetchPolicy, ImageFetcher, DEFAULT_MAX_ATTEMPTS,
    EXPECTED_FORMAT,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::{jpeg_bytes, png_bytes, MockHttpClient, MockReply};
