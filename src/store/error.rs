//! Error types for record store operations.

use thiserror::Error;

use crate::db::DbErrorKind;
use crate::feed::FeedError;
use crate::query::QueryError;

/// Errors that can occur while refreshing or querying the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification of the failure.
        kind: DbErrorKind,
        /// Human-readable database error text.
        message: String,
    },

    /// The feed failed mid-refresh. The record table is left empty.
    #[error(
        "feed refresh aborted: {0}\n  Suggestion: Run `mtv update` again; the record table stays empty until a refresh completes"
    )]
    Feed(#[from] FeedError),

    /// The search tokens did not compile.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A stored status marker could not be read back.
    #[error("invalid status marker '{key}': {reason}")]
    InvalidMarker {
        /// Marker key.
        key: String,
        /// What was wrong with the stored value.
        reason: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: DbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl StoreError {
    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<DbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::Feed(_) | Self::Query(_) | Self::InvalidMarker { .. } => None,
        }
    }
}
