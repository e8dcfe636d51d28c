//! Error types for remote-source fetch operations.
//!
//! The variants model the transport taxonomy explicitly so callers
//! pattern-match instead of relying on sentinel empty collections:
//! crawl planners turn failures into "zero entries found", the image
//! materializer maps them onto its outcome states.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching from the remote file server.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The resource does not exist (HTTP 404).
    #[error("not found (HTTP 404): {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// Any other non-success HTTP response (4xx/5xx).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors).
    #[error("connection error fetching {url}: {source}")]
    Connection {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// File system error while persisting a fetched body.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Anything the other variants do not cover.
    #[error("error fetching {url}: {message}")]
    Other {
        /// The URL that failed.
        url: String,
        /// Description of the failure.
        message: String,
    },
}

impl FetchError {
    /// Creates a not-found error.
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a connection error from a reqwest error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies a failed send: timeouts and connect failures get their own
    /// variants, everything else lands in `Other`.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() {
            Self::Connection { url, source }
        } else {
            Self::Other {
                url,
                message: source.to_string(),
            }
        }
    }

    /// True for failures worth re-attempting on a future pass
    /// (timeouts, connection errors, transient local IO).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::Io { .. }
        )
    }
}
