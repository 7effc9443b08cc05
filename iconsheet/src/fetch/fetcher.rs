//! Fetch-with-retry into the content-addressed cache.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use image::ImageFormat;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::error::FetchError;
use super::http::HttpClient;
use crate::cache::{derive_key, CacheKey, ImageCache};
use crate::storage::write_atomic;

/// Default number of attempts per URL.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 7;

/// The single image encoding accepted into the cache.
pub const EXPECTED_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Retry behaviour for a fetch.
///
/// Only "404 Not Found" responses are retried. The upstream image host is
/// known to answer 404 for images that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Maximum number of requests per URL, including the first.
    pub max_attempts: u32,
    /// Pause between not-found retries.
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
        }
    }
}

impl FetchPolicy {
    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between not-found retries.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

/// Where a cached image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// The file was already present; no request was made.
    Cached,
    /// The file was downloaded using this many requests.
    Downloaded { attempts: u32 },
}

/// A validated image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    /// Content-addressed key.
    pub key: CacheKey,
    /// Final path inside the cache directory.
    pub path: PathBuf,
    /// Whether the network was used.
    pub origin: CacheOrigin,
}

/// Downloads images into an [`ImageCache`].
///
/// A fetch either leaves a complete, validated image at its final cache path
/// or leaves nothing there at all.
pub struct ImageFetcher<C> {
    client: C,
    cache: ImageCache,
    policy: FetchPolicy,
}

impl<C: HttpClient> ImageFetcher<C> {
    /// Create a fetcher writing into `cache`.
    pub fn new(client: C, cache: ImageCache, policy: FetchPolicy) -> Self {
        Self {
            client,
            cache,
            policy,
        }
    }

    /// Returns the cache this fetcher writes into.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Resolve `url` to a cached image file, downloading it if needed.
    ///
    /// An existing file at the cache path is returned as-is without any
    /// network access or re-validation.
    ///
    /// # Errors
    ///
    /// See [`FetchError`]. Nothing is written to the cache on error.
    #[instrument(skip(self, cancel), fields(max_attempts = self.policy.max_attempts))]
    pub async fn fetch_and_cache(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<CachedImage, FetchError> {
        let key = derive_key(url)?;
        let path = self.cache.path_for(&key);

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| FetchError::Io {
                path: path.clone(),
                source: e,
            })?;
        if exists {
            debug!(key = %key, "Cache hit");
            return Ok(CachedImage {
                key,
                path,
                origin: CacheOrigin::Cached,
            });
        }

        let (body, attempts) = self.download(url, cancel).await?;
        validate_content(url, &body)?;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        let size = body.len();
        let dest = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dest, &body))
            .await
            .map_err(|e| FetchError::Io {
                path: path.clone(),
                source: io::Error::other(e.to_string()),
            })?
            .map_err(|e| FetchError::Io {
                path: path.clone(),
                source: e,
            })?;

        debug!(key = %key, attempts, size_bytes = size, "Image cached");
        Ok(CachedImage {
            key,
            path,
            origin: CacheOrigin::Downloaded { attempts },
        })
    }

    /// Bounded retry loop. Returns the body and the number of requests made.
    async fn download(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, u32), FetchError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url: url.to_string() });
                }
                result = self.client.get(url) => result?,
            };

            if response.status.is_success() {
                return Ok((response.body, attempt + 1));
            }

            if response.status != StatusCode::NOT_FOUND {
                return Err(FetchError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }

            warn!(
                attempt = attempt + 1,
                max_attempts, "Upstream answered not found, retrying"
            );

            let delay = self.policy.retry_delay;
            if !delay.is_zero() && attempt + 1 < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(FetchError::Cancelled { url: url.to_string() });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(FetchError::MaxAttemptsExceeded {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }
}

/// Check that `body` is an image of [`EXPECTED_FORMAT`] by its magic bytes.
pub fn validate_content(url: &str, body: &[u8]) -> Result<(), FetchError> {
    let detected = match image::guess_format(body) {
        Ok(format) if format == EXPECTED_FORMAT => return Ok(()),
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => "unknown".to_string(),
    };

    Err(FetchError::InvalidContentType {
        url: url.to_string(),
        expected: EXPECTED_FORMAT.to_mime_type(),
        detected,
    })
}
