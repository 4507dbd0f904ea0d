//! Error types for the download module.
//!
//! [`DownloadError`] covers a single fetch and is caught per record.
//! [`RunError`] aborts a whole ledger run.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Errors that can occur while fetching one URL to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
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

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Maps a request error, keeping timeouts distinct.
    pub(crate) fn from_request(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }
}

/// Errors that abort a ledger download run.
///
/// Individual fetch failures never end up here; they are recorded as
/// `failed` in the ledger.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reading or updating the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Writing the run marker failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = DownloadError::http_status("https://media.example.de/a.mp4", 404);
        assert_eq!(
            err.to_string(),
            "HTTP 404 downloading https://media.example.de/a.mp4"
        );
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = DownloadError::io(
            "/videos/a.mp4",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/videos/a.mp4"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_invalid_url_display() {
        assert_eq!(
            DownloadError::invalid_url("not a url").to_string(),
            "invalid URL: not a url"
        );
    }

    #[test]
    fn test_run_error_wraps_ledger_error() {
        let err = RunError::from(LedgerError::invalid_row("abc", "bad"));
        assert!(err.to_string().contains("abc"));
    }
}
