//! mtv Core Library
//!
//! This library catalogues broadcast programs from the `MediathekView` feed,
//! makes them searchable in a local `SQLite` store and keeps a download ledger
//! that survives feed refreshes.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`record`] - The program record and quality-URL resolution
//! - [`feed`] - Streaming reconstruction of records from the JSON feed
//! - [`query`] - Compiling search tokens into SQL
//! - [`db`] - Database connection and schema management
//! - [`store`] - Full-refresh record table and status markers
//! - [`ledger`] - Per-record download status lifecycle
//! - [`download`] - HTTP transport and ledger-driven download runs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod db;
pub mod download;
pub mod feed;
pub mod ledger;
pub mod query;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use db::{Database, DbError, DbErrorKind, WriteLock};
pub use download::{
    DownloadError, DownloadRunner, DownloadStats, Fetcher, HttpClient, RunError,
};
pub use feed::{AgeDurationFilter, FeedError, FeedReader, FeedSource, record_stream};
pub use ledger::{Ledger, LedgerEntry, LedgerError, LedgerItem, LedgerListing, LedgerStatus};
pub use query::{CompiledQuery, QueryError, compile};
pub use record::{Quality, Record, RecordParseError};
pub use store::{RecordStore, RefreshSummary, StatusMarker, StatusMarkers, StoreError};
