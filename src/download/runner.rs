//! Download runs: resolve, fetch and record the outcome in the ledger.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::error::{DownloadError, RunError};
use super::fetcher::Fetcher;
use super::filename::target_file_name;
use crate::ledger::{Ledger, LedgerStatus};
use crate::record::{Quality, Record};
use crate::store::{LAST_DOWNLOAD, StatusMarkers};

/// Called before each fetch with the 1-based position, the total and the record.
pub type ProgressHook = Arc<dyn Fn(usize, usize, &Record) + Send + Sync>;

/// Ledger statuses picked up by [`DownloadRunner::download_marked`].
pub const RUNNABLE_STATUSES: [LedgerStatus; 2] = [LedgerStatus::Pending, LedgerStatus::Failed];

/// Counts of one download run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Records fetched successfully.
    pub completed: usize,
    /// Records whose fetch failed.
    pub failed: usize,
}

impl DownloadStats {
    /// Returns the number of records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// Fetches records at a configured quality into a target directory.
pub struct DownloadRunner<F> {
    fetcher: F,
    target_dir: PathBuf,
    quality: Quality,
    progress: Option<ProgressHook>,
}

impl<F> std::fmt::Debug for DownloadRunner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRunner")
            .field("target_dir", &self.target_dir)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

impl<F: Fetcher> DownloadRunner<F> {
    /// Creates a runner writing into `target_dir`.
    pub fn new(fetcher: F, target_dir: impl Into<PathBuf>, quality: Quality) -> Self {
        Self {
            fetcher,
            target_dir: target_dir.into(),
            quality,
            progress: None,
        }
    }

    /// Installs a progress hook.
    #[must_use]
    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    /// The requested quality.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// The directory downloads are written to.
    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Where `record` would be written.
    #[must_use]
    pub fn target_path(&self, record: &Record) -> PathBuf {
        let (_, url) = record.resolve_url(self.quality);
        self.target_dir.join(target_file_name(record, &url))
    }

    /// Fetches one record, falling back to a lower quality when needed.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's [`DownloadError`].
    #[instrument(skip(self, record), fields(record = %record))]
    pub async fn download_record(&self, record: &Record) -> Result<PathBuf, DownloadError> {
        let (actual, url) = record.resolve_url(self.quality);
        if actual != self.quality {
            warn!(
                requested = %self.quality,
                actual = %actual,
                "requested quality not available, using fallback"
            );
        }
        let path = self.target_dir.join(target_file_name(record, &url));
        let bytes = self.fetcher.fetch(&url, &path).await?;
        info!(path = %path.display(), bytes, quality = %actual, "record downloaded");
        Ok(path)
    }

    /// Fetches `records` right away without touching the ledger.
    ///
    /// Failures are logged and counted; they never stop the batch.
    pub async fn download_now(&self, records: &[Record]) -> DownloadStats {
        let mut stats = DownloadStats::default();
        for (index, record) in records.iter().enumerate() {
            self.report(index, records.len(), record);
            match self.download_record(record).await {
                Ok(_) => stats.completed += 1,
                Err(error) => {
                    warn!(record = %record, error = %error, "download failed");
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    /// Fetches every pending or failed ledger entry and records the outcome.
    ///
    /// Each entry becomes `complete` or `failed`; afterwards the
    /// `last_download` marker holds the run's counts.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when the ledger or the marker cannot be read or
    /// written. Fetch failures are not errors.
    #[instrument(skip_all)]
    pub async fn download_marked(
        &self,
        ledger: &Ledger,
        markers: &StatusMarkers,
    ) -> Result<DownloadStats, RunError> {
        let listings = ledger.list_by_status(&RUNNABLE_STATUSES).await?;
        info!(count = listings.len(), "starting download run");

        let mut stats = DownloadStats::default();
        for (index, listing) in listings.iter().enumerate() {
            let record = &listing.record;
            self.report(index, listings.len(), record);
            let status = match self.download_record(record).await {
                Ok(_) => {
                    stats.completed += 1;
                    LedgerStatus::Complete
                }
                Err(error) => {
                    warn!(record = %record, error = %error, "download failed");
                    stats.failed += 1;
                    LedgerStatus::Failed
                }
            };
            ledger.update_status(record, status).await?;
        }

        let summary = format!("{} complete, {} failed", stats.completed, stats.failed);
        markers.set(LAST_DOWNLOAD, Some(&summary)).await?;
        info!(completed = stats.completed, failed = stats.failed, "download run finished");
        Ok(stats)
    }

    fn report(&self, index: usize, total: usize, record: &Record) {
        if let Some(hook) = &self.progress {
            hook(index + 1, total, record);
        }
    }
}
