//! Media downloads: HTTP transport, target naming and ledger-driven runs.
//!
//! [`HttpClient`] streams a response body to disk. [`DownloadRunner`] picks
//! the URL for the configured quality, names the target file and, for marked
//! downloads, writes the outcome back to the [`Ledger`](crate::ledger::Ledger).
//!
//! # Example
//!
//! ```no_run
//! use mtv_core::download::{DownloadRunner, HttpClient};
//! use mtv_core::record::Quality;
//!
//! # async fn example(records: Vec<mtv_core::record::Record>) -> Result<(), Box<dyn std::error::Error>> {
//! let runner = DownloadRunner::new(HttpClient::new()?, "./downloads", Quality::Hd);
//! let stats = runner.download_now(&records).await;
//! println!("{} complete, {} failed", stats.completed, stats.failed);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod fetcher;
mod filename;
mod runner;

pub use client::HttpClient;
pub use error::{DownloadError, RunError};
pub use fetcher::Fetcher;
pub use filename::{extension_from_url, target_file_name};
pub use runner::{DownloadRunner, DownloadStats, ProgressHook, RUNNABLE_STATUSES};
