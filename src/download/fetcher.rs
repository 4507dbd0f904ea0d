//! The transport seam used by the download runner.

use std::path::Path;

use async_trait::async_trait;

use super::error::DownloadError;

/// Writes the resource at a URL to a local file.
///
/// [`HttpClient`](super::HttpClient) is the production implementation; tests
/// substitute their own. Uses `async_trait` so runners can hold
/// `Box<dyn Fetcher>`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` into `dest` and returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        (**self).fetch(url, dest).await
    }
}
