//! Error types for query compilation.

use thiserror::Error;

/// Errors produced while compiling search tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A date filter value is not `day.month.year`.
    #[error(
        "invalid date '{value}' in filter '{token}'\n  Suggestion: use day.month.year, e.g. datum:24.12.23 or datum:>=1.1.2024"
    )]
    InvalidDate {
        /// The full token the value came from.
        token: String,
        /// The offending date text.
        value: String,
    },
}

impl QueryError {
    pub(crate) fn invalid_date(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            token: token.into(),
            value: value.into(),
        }
    }
}
