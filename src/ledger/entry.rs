//! Ledger entry types and status definitions.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::error::LedgerError;
use crate::record::{ISO_DATE_FORMAT, Record};

/// Download status of a ledger entry.
///
/// `Pending` moves to `Complete` or `Failed`; `Failed` may be retried into
/// either state. Transitions are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Marked for download.
    Pending,
    /// The last attempt failed.
    Failed,
    /// Downloaded.
    Complete,
}

impl LedgerStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Failed, Self::Complete];

    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LedgerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("invalid ledger status: {s}")),
        }
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Record id (content hash).
    pub id: String,
    /// Air date of the record when it was marked.
    pub date: Option<NaiveDate>,
    /// Current status.
    pub status: LedgerStatus,
    /// Day the status was last set.
    pub status_date: NaiveDate,
}

/// A ledger entry joined with its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerListing {
    /// The record.
    pub record: Record,
    /// Current status.
    pub status: LedgerStatus,
    /// Day the status was last set.
    pub status_date: NaiveDate,
}

/// A ledger entry with its record, when the record is in the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerItem {
    /// The ledger row.
    pub entry: LedgerEntry,
    /// The record, or `None` once a refresh dropped it from the film list.
    pub record: Option<Record>,
}

#[derive(Debug, FromRow)]
pub(crate) struct LedgerRow {
    pub id: String,
    pub date: Option<String>,
    pub status: String,
    pub status_date: String,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let status = parse_status(&row.id, &row.status)?;
        let status_date = parse_date(&row.id, &row.status_date)?;
        let date = row
            .date
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(|text| parse_date(&row.id, text))
            .transpose()?;
        Ok(Self {
            id: row.id,
            date,
            status,
            status_date,
        })
    }
}

pub(crate) fn parse_status(id: &str, text: &str) -> Result<LedgerStatus, LedgerError> {
    text.parse().map_err(|reason: String| LedgerError::invalid_row(id, reason))
}

pub(crate) fn parse_date(id: &str, text: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(text, ISO_DATE_FORMAT)
        .map_err(|e| LedgerError::invalid_row(id, format!("invalid date '{text}': {e}")))
}
