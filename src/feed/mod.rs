//! Feed ingestion.
//!
//! The broadcast feed is one large JSON document. This module turns it into a
//! lazy sequence of [`Record`](crate::record::Record)s in bounded memory:
//!
//! - [`reader`] - [`FeedReader`], the record reconstructor driven by `serde_json`
//! - [`source`] - locating, fetching and opening feeds, plus the async bridge
//! - [`AgeDurationFilter`] - the age and duration cut applied before storing

mod error;
mod filter;
pub mod reader;
pub mod source;

pub use error::FeedError;
pub use filter::AgeDurationFilter;
pub use reader::{FeedReader, RECORD_KEY};
pub use source::{
    CACHED_FEED_FILE, DEFAULT_FEED_URL, FeedSource, open_feed_file, record_stream,
};
