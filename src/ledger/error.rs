//! Error types for ledger operations.

use thiserror::Error;

use crate::db::DbErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification used to tell contention from breakage.
        kind: DbErrorKind,
        /// Human-readable database error text.
        message: String,
    },

    /// A stored ledger row could not be read back.
    #[error(
        "invalid ledger row for {id}: {reason}\n  Suggestion: Remove the entry with `mtv unmark` and mark the record again"
    )]
    InvalidRow {
        /// Record id of the row.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: DbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl LedgerError {
    pub(crate) fn invalid_row(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<DbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::InvalidRow { .. } => None,
        }
    }

    /// Returns true when this error is a database busy/locked condition.
    #[must_use]
    pub fn is_busy_or_locked(&self) -> bool {
        self.database_kind() == Some(DbErrorKind::BusyOrLocked)
    }
}
