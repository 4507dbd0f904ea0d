//! Download ledger: a persistent status per record.
//!
//! The ledger is keyed by record id (the content hash), so entries survive
//! feed refreshes and keep pointing at the same program. Each entry carries a
//! [`LedgerStatus`] and the day it was last set.
//!
//! # Example
//!
//! ```ignore
//! use mtv_core::ledger::{Ledger, LedgerStatus};
//! use mtv_core::{Database, WriteLock};
//!
//! let db = Database::new(Path::new("filme.sqlite")).await?;
//! let ledger = Ledger::new(db, WriteLock::new());
//!
//! ledger.mark_pending(&selected, today).await?;
//! for listing in ledger.list_by_status(&[LedgerStatus::Pending]).await? {
//!     // ... fetch listing.record ...
//!     ledger.update_status(&listing.record, LedgerStatus::Complete).await?;
//! }
//! ```

mod entry;
mod error;

pub use entry::{LedgerEntry, LedgerItem, LedgerListing, LedgerStatus};
pub use error::LedgerError;

use chrono::{Local, NaiveDate};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, instrument};

use crate::db::{Database, WriteLock};
use crate::record::{ISO_DATE_FORMAT, Record};
use entry::{LedgerRow, parse_date, parse_status};

const ENTRY_ORDER: &str = " ORDER BY d.status_date DESC, r.sender, r.title, d.id";

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger over the `downloads` table.
///
/// Single-row status updates are serialised through the [`WriteLock`] the
/// ledger was created with. Bulk inserts and removals run without it.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    lock: WriteLock,
}

impl Ledger {
    /// Creates a ledger handle.
    #[must_use]
    pub fn new(db: Database, lock: WriteLock) -> Self {
        Self { db, lock }
    }

    /// Marks `records` as pending with status date `today`.
    ///
    /// Records that already have an entry are left untouched.
    ///
    /// # Returns
    ///
    /// The number of entries created.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the insert fails; no entry is
    /// created in that case.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn mark_pending(&self, records: &[Record], today: NaiveDate) -> Result<u64> {
        let today = today.format(ISO_DATE_FORMAT).to_string();
        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;
        for record in records {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO downloads (id, date, status, status_date) VALUES (?, ?, ?, ?)",
            )
            .bind(record.id())
            .bind(record.date_iso())
            .bind(LedgerStatus::Pending.as_str())
            .bind(&today)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        debug!(inserted, "marked pending");
        Ok(inserted)
    }

    /// Sets the status of `record`'s entry, dated today.
    ///
    /// # Returns
    ///
    /// `false` when the record has no entry; nothing is written then.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the update fails.
    pub async fn update_status(&self, record: &Record, status: LedgerStatus) -> Result<bool> {
        self.update_status_on(record, status, Local::now().date_naive())
            .await
    }

    /// Sets the status of `record`'s entry with an explicit status date.
    ///
    /// # Returns
    ///
    /// `false` when the record has no entry; nothing is written then.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the update fails.
    #[instrument(skip(self, record, status), fields(record = %record, status = %status))]
    pub async fn update_status_on(
        &self,
        record: &Record,
        status: LedgerStatus,
        date: NaiveDate,
    ) -> Result<bool> {
        let _guard = self.lock.acquire().await;
        let result = sqlx::query("UPDATE downloads SET status = ?, status_date = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(date.format(ISO_DATE_FORMAT).to_string())
            .bind(record.id())
            .execute(self.db.pool())
            .await?;
        let updated = result.rows_affected() > 0;
        if !updated {
            debug!("no ledger entry, status not written");
        }
        Ok(updated)
    }

    /// Lists entries whose status is in `statuses`, newest status date first.
    ///
    /// Entries whose record is not in the current snapshot are not listed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the query fails and
    /// [`LedgerError::InvalidRow`] for unreadable rows.
    #[instrument(skip(self))]
    pub async fn list_by_status(&self, statuses: &[LedgerStatus]) -> Result<Vec<LedgerListing>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT r.*, d.status AS ledger_status, d.status_date AS ledger_status_date \
             FROM records r JOIN downloads d ON r.id = d.id WHERE d.status IN (",
        );
        let mut separated = builder.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");
        builder.push(ENTRY_ORDER);

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter()
            .map(|row| -> Result<LedgerListing> {
                let record = <Record as sqlx::FromRow<_>>::from_row(row)?;
                let id: String = row.try_get("id")?;
                let status_text: String = row.try_get("ledger_status")?;
                let date_text: String = row.try_get("ledger_status_date")?;
                Ok(LedgerListing {
                    status: parse_status(&id, &status_text)?,
                    status_date: parse_date(&id, &date_text)?,
                    record,
                })
            })
            .collect()
    }

    /// Lists every entry whose status is in `statuses`, with or without a
    /// record in the current snapshot, newest status date first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the query fails and
    /// [`LedgerError::InvalidRow`] for unreadable rows.
    #[instrument(skip(self))]
    pub async fn list_entries(&self, statuses: &[LedgerStatus]) -> Result<Vec<LedgerItem>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT r.*, r.id AS record_id, d.id AS ledger_id, d.date AS ledger_date, \
             d.status AS ledger_status, d.status_date AS ledger_status_date \
             FROM downloads d LEFT JOIN records r ON r.id = d.id WHERE d.status IN (",
        );
        let mut separated = builder.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");
        builder.push(ENTRY_ORDER);

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter()
            .map(|row| -> Result<LedgerItem> {
                let entry = LedgerEntry::try_from(LedgerRow {
                    id: row.try_get("ledger_id")?,
                    date: row.try_get("ledger_date")?,
                    status: row.try_get("ledger_status")?,
                    status_date: row.try_get("ledger_status_date")?,
                })?;
                let record_id: Option<String> = row.try_get("record_id")?;
                let record = match record_id {
                    Some(_) => Some(<Record as sqlx::FromRow<_>>::from_row(row)?),
                    None => None,
                };
                Ok(LedgerItem { entry, record })
            })
            .collect()
    }

    /// Deletes the entries of `records`.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the delete fails.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn remove(&self, records: &[Record]) -> Result<u64> {
        let ids: Vec<String> = records.iter().map(Record::id).collect();
        self.remove_ids(&ids).await
    }

    /// Deletes `entries` by id, whether or not their record is still listed.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the delete fails.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn remove_entries(&self, entries: &[LedgerEntry]) -> Result<u64> {
        let ids: Vec<String> = entries.iter().map(|entry| entry.id.clone()).collect();
        self.remove_ids(&ids).await
    }

    async fn remove_ids(&self, ids: &[String]) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        let mut removed = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM downloads WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;
        debug!(removed, "removed ledger entries");
        Ok(removed)
    }

    /// Returns the entry for `record`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the query fails and
    /// [`LedgerError::InvalidRow`] for an unreadable row.
    pub async fn get(&self, record: &Record) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, LedgerRow>(
            "SELECT id, date, status, status_date FROM downloads WHERE id = ?",
        )
        .bind(record.id())
        .fetch_optional(self.db.pool())
        .await?;
        row.map(LedgerEntry::try_from).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn record(title: &str) -> Record {
        Record {
            sender: "ARD".to_string(),
            topic: "Tatort".to_string(),
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 15),
            time: NaiveTime::from_hms_opt(20, 15, 0),
            duration: Some(90),
            size: 1200,
            description: String::new(),
            url: format!("https://media.example.de/{title}.mp4"),
            website: String::new(),
            url_subtitle: String::new(),
            url_rtmp: String::new(),
            url_small: String::new(),
            url_rtmp_small: String::new(),
            url_hd: String::new(),
            url_rtmp_hd: String::new(),
            date_l: None,
            url_history: String::new(),
            geo: String::new(),
            is_new: false,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    async fn ledger() -> Ledger {
        let db = Database::new_in_memory().await.unwrap();
        Ledger::new(db, WriteLock::new())
    }

    // ==================== mark_pending ====================

    #[tokio::test]
    async fn test_mark_pending_creates_entries() {
        let ledger = ledger().await;
        let inserted = ledger
            .mark_pending(&[record("a"), record("b")], day(1))
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let entry = ledger.get(&record("a")).await.unwrap().unwrap();
        assert_eq!(entry.status, LedgerStatus::Pending);
        assert_eq!(entry.status_date, day(1));
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(entry.id, record("a").id());
    }

    #[tokio::test]
    async fn test_mark_pending_twice_keeps_original_date() {
        let ledger = ledger().await;
        ledger.mark_pending(&[record("a")], day(1)).await.unwrap();
        let inserted = ledger.mark_pending(&[record("a")], day(9)).await.unwrap();
        assert_eq!(inserted, 0);

        let entry = ledger.get(&record("a")).await.unwrap().unwrap();
        assert_eq!(entry.status_date, day(1));
    }

    #[tokio::test]
    async fn test_mark_pending_does_not_reset_complete() {
        let ledger = ledger().await;
        ledger.mark_pending(&[record("a")], day(1)).await.unwrap();
        ledger
            .update_status_on(&record("a"), LedgerStatus::Complete, day(2))
            .await
            .unwrap();
        ledger.mark_pending(&[record("a")], day(3)).await.unwrap();

        let entry = ledger.get(&record("a")).await.unwrap().unwrap();
        assert_eq!(entry.status, LedgerStatus::Complete);
    }

    // ==================== update_status ====================

    #[tokio::test]
    async fn test_update_failed_to_complete_touches_only_that_row() {
        let ledger = ledger().await;
        ledger
            .mark_pending(&[record("a"), record("b")], day(1))
            .await
            .unwrap();
        ledger
            .update_status_on(&record("a"), LedgerStatus::Failed, day(2))
            .await
            .unwrap();

        let updated = ledger
            .update_status_on(&record("a"), LedgerStatus::Complete, day(3))
            .await
            .unwrap();
        assert!(updated);

        let a = ledger.get(&record("a")).await.unwrap().unwrap();
        assert_eq!(a.status, LedgerStatus::Complete);
        assert_eq!(a.status_date, day(3));
        let b = ledger.get(&record("b")).await.unwrap().unwrap();
        assert_eq!(b.status, LedgerStatus::Pending);
        assert_eq!(b.status_date, day(1));
    }

    #[tokio::test]
    async fn test_update_without_entry_is_noop() {
        let ledger = ledger().await;
        let updated = ledger
            .update_status(&record("ghost"), LedgerStatus::Complete)
            .await
            .unwrap();
        assert!(!updated);
        assert!(ledger.get(&record("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_uses_today() {
        let ledger = ledger().await;
        ledger.mark_pending(&[record("a")], day(1)).await.unwrap();
        ledger
            .update_status(&record("a"), LedgerStatus::Failed)
            .await
            .unwrap();

        let entry = ledger.get(&record("a")).await.unwrap().unwrap();
        assert_eq!(entry.status_date, Local::now().date_naive());
    }

    // ==================== remove ====================

    #[tokio::test]
    async fn test_remove_counts_existing_entries_only() {
        let ledger = ledger().await;
        ledger
            .mark_pending(&[record("a"), record("b")], day(1))
            .await
            .unwrap();

        let removed = ledger
            .remove(&[record("a"), record("ghost")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(ledger.get(&record("a")).await.unwrap().is_none());
        assert!(ledger.get(&record("b")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_entries_without_records() {
        let ledger = ledger().await;
        ledger
            .mark_pending(&[record("a"), record("b")], day(1))
            .await
            .unwrap();

        let items = ledger.list_entries(&LedgerStatus::ALL).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.record.is_none()));

        let entries: Vec<LedgerEntry> = items.into_iter().map(|item| item.entry).collect();
        assert_eq!(ledger.remove_entries(&entries).await.unwrap(), 2);
        assert!(ledger.list_entries(&LedgerStatus::ALL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_entries_filters_by_status() {
        let ledger = ledger().await;
        ledger
            .mark_pending(&[record("a"), record("b")], day(1))
            .await
            .unwrap();
        ledger
            .update_status_on(&record("b"), LedgerStatus::Complete, day(3))
            .await
            .unwrap();

        let complete = ledger.list_entries(&[LedgerStatus::Complete]).await.unwrap();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].entry.id, record("b").id());
        assert_eq!(complete[0].entry.status_date, day(3));
        assert!(ledger.list_entries(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_status_with_no_statuses_is_empty() {
        let ledger = ledger().await;
        assert!(ledger.list_by_status(&[]).await.unwrap().is_empty());
    }
}
