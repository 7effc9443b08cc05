//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use super::error::FetchError;

/// Default timeout for a single HTTP request in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A buffered HTTP response.
///
/// The body is only populated for success statuses; error responses are
/// classified by status alone.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Full response body.
    pub body: Vec<u8>,
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response status and body, or [`FetchError::Transport`] when no
    /// response was received at all. Non-success statuses are not errors
    /// at this layer.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("iconsheet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("timed out after {}s", self.timeout.as_secs())
            } else {
                e.to_string()
            };
            FetchError::Transport {
                url: url.to_string(),
                reason,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse {
                status,
                body: Vec::new(),
            });
        }

        // Read response body
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: format!("failed to read response: {}", e),
            })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A canned reply from [`MockHttpClient`].
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Status(StatusCode, Vec<u8>),
        Transport(String),
    }

    impl MockReply {
        pub fn ok(body: Vec<u8>) -> Self {
            MockReply::Status(StatusCode::OK, body)
        }

        pub fn not_found() -> Self {
            MockReply::Status(StatusCode::NOT_FOUND, Vec::new())
        }
    }

    /// Mock HTTP client for testing.
    ///
    /// Replies are served from `script` in order; once it is exhausted every
    /// request gets `fallback`.
    pub struct MockHttpClient {
        script: Mutex<VecDeque<MockReply>>,
        fallback: MockReply,
        calls: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn always(reply: MockReply) -> Self {
            Self::scripted(Vec::new(), reply)
        }

        pub fn scripted(script: Vec<MockReply>, fallback: MockReply) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            match reply {
                MockReply::Status(status, body) => Ok(HttpResponse { status, body }),
                MockReply::Transport(reason) => Err(FetchError::Transport {
                    url: url.to_string(),
                    reason,
                }),
            }
        }
    }

    /// Encode a solid-colour JPEG.
    pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    /// Encode a solid-colour PNG.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_mock_client_script_then_fallback() {
        let mock = MockHttpClient::scripted(
            vec![MockReply::not_found()],
            MockReply::ok(vec![1, 2, 3, 4]),
        );

        let first = mock.get("http://example.com").await.unwrap();
        assert_eq!(first.status, StatusCode::NOT_FOUND);

        let second = mock.get("http://example.com").await.unwrap();
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(second.body, vec![1, 2, 3, 4]);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockHttpClient::always(MockReply::Transport("Test error".to_string()));

        let result = mock.get("http://example.com").await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[test]
    fn test_reqwest_client_timeout() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));

        let client = ReqwestClient::new().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn test_reqwest_client_connection_refused_is_transport_error() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(2)).unwrap();
        // Port 1 (tcpmux) is essentially never listening.
        let result = client.get("http://127.0.0.1:1/icon.jpg").await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }
}
