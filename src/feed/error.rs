//! Error types for feed ingestion.

use std::path::PathBuf;

use serde_json::error::Category;
use thiserror::Error;

use crate::download::DownloadError;
use crate::record::RecordParseError;

/// Errors that abort a feed pass.
///
/// Feed errors are never recovered from record by record: the first error ends
/// the sequence.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Reading the underlying byte source failed.
    #[error("IO error reading feed: {0}")]
    Io(#[from] std::io::Error),

    /// Opening a feed file failed.
    #[error("cannot open feed file {path}: {source}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The byte stream is not well-formed JSON, or not shaped like a feed.
    #[error("feed syntax error: {message}")]
    Syntax {
        /// One-based line in the (decompressed) stream.
        line: usize,
        /// One-based column.
        column: usize,
        /// What was expected or found, with its position.
        message: String,
    },

    /// The stream ended inside a value or container.
    #[error("feed ended unexpectedly at line {line} column {column}")]
    UnexpectedEof {
        /// Line where input ran out.
        line: usize,
        /// Column where input ran out.
        column: usize,
    },

    /// A record array contained a nested array or object.
    #[error("nested container inside record #{index}")]
    NestedContainer {
        /// Zero-based index of the record being accumulated.
        index: u64,
    },

    /// A record's fields could not be parsed.
    #[error("invalid record #{index}: {source}")]
    Record {
        /// Zero-based index of the record in the feed.
        index: u64,
        /// The underlying parse error.
        #[source]
        source: RecordParseError,
    },

    /// Fetching a remote feed failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The blocking reader task stopped without reporting a result.
    #[error("feed reader task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(error: serde_json::Error) -> Self {
        let (line, column) = (error.line(), error.column());
        match error.classify() {
            Category::Io => Self::Io(error.into()),
            Category::Eof => Self::UnexpectedEof { line, column },
            Category::Syntax | Category::Data => Self::Syntax {
                line,
                column,
                message: error.to_string(),
            },
        }
    }
}
