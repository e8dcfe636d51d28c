//! HTTP client wrapper for the remote file server.
//!
//! This module provides the `HttpFetcher` struct which issues bounded-timeout
//! GET requests for directory-index documents and image bytes. Every request
//! is classified into the [`FetchError`] taxonomy; nothing is retried here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, IMAGE_TIMEOUT_SECS, LISTING_TIMEOUT_SECS};
use super::error::FetchError;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("ohmc-sync/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the remote file server.
///
/// Designed to be created once and reused across a whole sync run, taking
/// advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use ohmc_sync_core::fetch::HttpFetcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new();
/// let body = fetcher.get_text("https://example.com/dir/").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    listing_timeout: Duration,
    image_timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a new fetcher with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 10 seconds
    /// - Listing request timeout: 10 seconds
    /// - Image request timeout: 30 seconds
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(LISTING_TIMEOUT_SECS, IMAGE_TIMEOUT_SECS)
    }

    /// Creates a new fetcher with explicit per-request timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(listing_timeout_secs: u64, image_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            listing_timeout: Duration::from_secs(listing_timeout_secs),
            image_timeout: Duration::from_secs(image_timeout_secs),
        }
    }

    /// Fetches a URL and returns the response body as text.
    ///
    /// Used for directory-index documents. One GET, no retry.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] classifying the failure: `NotFound` for 404,
    /// `HttpStatus` for other non-2xx responses, `Timeout`/`Connection` for
    /// transport failures.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url, self.listing_timeout).await?;

        response
            .text()
            .await
            .map_err(|e| FetchError::from_request(url, e))
    }

    /// Downloads a URL's body to the given destination path, streaming.
    ///
    /// A partially written file is removed when the body stream fails, so a
    /// failed download never leaves truncated image data behind.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] classifying the failure; `Io` for local
    /// filesystem errors.
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        // Validate early so a bad URL is reported as such, not as transport.
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.send(url, self.image_timeout).await?;

        let mut file = File::create(dest)
            .await
            .map_err(|e| FetchError::io(dest.to_path_buf(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, dest).await;
        if stream_result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes_written = stream_result?;

        info!(path = %dest.display(), bytes = bytes_written, "download complete");
        Ok(bytes_written)
    }

    /// Issues one GET with the given total timeout and maps the status.
    async fn send(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_request(url, e))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(FetchError::not_found(url));
        }
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams response body to file, returning bytes written.
///
/// Extracted so the caller can clean up the partial file on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    dest: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::from_request(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(dest.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(PathBuf::from(dest), e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_text_returns_body_on_200() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dir/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new();
        let body = fetcher
            .get_text(&format!("{}/dir/", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_get_text_404_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new();
        let result = fetcher
            .get_text(&format!("{}/missing/", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(FetchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_text_500_is_http_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new();
        let result = fetcher
            .get_text(&format!("{}/error/", mock_server.uri()))
            .await;

        match result {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_text_connection_refused_is_transient() {
        // Port 1 is essentially guaranteed to refuse connections.
        let fetcher = HttpFetcher::new();
        let result = fetcher.get_text("http://127.0.0.1:1/dir/").await;

        let error = result.unwrap_err();
        assert!(error.is_transient(), "Expected transient error: {error}");
    }

    #[tokio::test]
    async fn test_download_to_file_writes_body() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/FWI.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png bytes"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new();
        let dest = temp_dir.path().join("FWI.png");
        let bytes = fetcher
            .download_to_file(&format!("{}/FWI.png", mock_server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(bytes, 9);
        assert_eq!(std::fs::read(&dest).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn test_download_to_file_404_leaves_no_file() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new();
        let dest = temp_dir.path().join("missing.png");
        let result = fetcher
            .download_to_file(&format!("{}/missing.png", mock_server.uri()), &dest)
            .await;

        assert!(matches!(result, Err(FetchError::NotFound { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_to_file_cleans_up_partial_on_timeout() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_timeouts(10, 1);
        let dest = temp_dir.path().join("slow.png");
        let result = fetcher
            .download_to_file(&format!("{}/slow.png", mock_server.uri()), &dest)
            .await;

        assert!(result.is_err(), "expected timeout or network error");
        assert!(!dest.exists(), "partial file must be cleaned up");
    }

    #[tokio::test]
    async fn test_download_to_file_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = HttpFetcher::new();

        let result = fetcher
            .download_to_file("not-a-valid-url", &temp_dir.path().join("x.png"))
            .await;

        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
