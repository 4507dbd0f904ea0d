//! Error types for building records from raw feed fields.

use thiserror::Error;

/// Errors raised while turning positional feed strings into a [`Record`](super::Record).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordParseError {
    /// The record array carried fewer scalars than the fixed field layout.
    #[error("record has {found} fields, expected {expected}")]
    FieldCount {
        /// Number of scalars found in the record array.
        found: usize,
        /// Number of positional fields a record requires.
        expected: usize,
    },

    /// A date field is not in `day.month.year` form.
    #[error("invalid date '{value}' in field '{field}'\n  Suggestion: Expected day.month.year, e.g. 24.12.2023")]
    InvalidDate {
        /// Field name.
        field: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// A time or duration field is not in `hour:minute:second` form.
    #[error("invalid time '{value}' in field '{field}'\n  Suggestion: Expected hour:minute:second, e.g. 20:15:00")]
    InvalidTime {
        /// Field name.
        field: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// A numeric field does not hold an integer.
    #[error("invalid number '{value}' in field '{field}'")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Offending raw value.
        value: String,
    },
}

impl RecordParseError {
    pub(crate) fn invalid_date(field: &'static str, value: &str) -> Self {
        Self::InvalidDate {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid_time(field: &'static str, value: &str) -> Self {
        Self::InvalidTime {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid_number(field: &'static str, value: &str) -> Self {
        Self::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_display_names_field_and_value() {
        let error = RecordParseError::invalid_date("date", "2023-01-01");
        let msg = error.to_string();
        assert!(msg.contains("'date'"), "Expected field in: {msg}");
        assert!(msg.contains("2023-01-01"), "Expected value in: {msg}");
        assert!(msg.contains("Suggestion"), "Expected suggestion in: {msg}");
    }

    #[test]
    fn test_field_count_display() {
        let error = RecordParseError::FieldCount {
            found: 3,
            expected: 20,
        };
        assert_eq!(error.to_string(), "record has 3 fields, expected 20");
    }
}
