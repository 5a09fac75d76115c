use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Classified outcome of a failed feed fetch.
///
/// Every variant is scoped to the one source being fetched; none is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Connection-level failure (DNS, refused, TLS)
    #[error("Connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Any other request failure (body read, redirect loop, client setup)
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::Connection(err)
        } else {
            FetchError::Request(err)
        }
    }
}

/// Single-attempt HTTP fetcher for feed payloads.
///
/// Holds no per-call state; clones share the underlying connection pool.
#[derive(Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Request`] if the HTTP client cannot be built
    /// (e.g. TLS backend initialization failure).
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self::with_client(client, timeout))
    }

    /// Wrap an existing client (tests, shared pools)
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch the raw feed payload at `url` with exactly one attempt.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::info!(url = %url, "Fetching feed");

        let outcome = match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        match &outcome {
            Ok(bytes) => tracing::info!(url = %url, bytes = bytes.len(), "Feed fetched"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Feed fetch failed"),
        }
        outcome
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE, self.timeout).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::from_reqwest(e, timeout))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
