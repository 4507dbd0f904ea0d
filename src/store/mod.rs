//! Record store: the current feed snapshot in `SQLite`.
//!
//! A refresh replaces the whole record table; the download ledger lives in its
//! own table and is untouched. Lookups run compiled queries from
//! [`crate::query`] and stream rows back as [`Record`]s.

mod error;
mod row;
pub mod status;

use futures_util::{Stream, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use crate::db::Database;
use crate::feed::FeedError;
use crate::query::{self, CompiledQuery};
use crate::record::Record;

pub use error::StoreError;
pub use status::{LAST_DOWNLOAD, LAST_REFRESH, RECORD_COUNT, StatusMarker, StatusMarkers};

const PROGRESS_LOG_INTERVAL: u64 = 50_000;

/// Outcome of a completed refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Records read from the feed.
    pub read: u64,
    /// Rows stored after dropping duplicate ids.
    pub stored: u64,
}

/// Owner of the record table.
#[derive(Debug, Clone)]
pub struct RecordStore {
    db: Database,
    markers: StatusMarkers,
}

impl RecordStore {
    /// Creates a store over `db`, recording refresh markers through `markers`.
    #[must_use]
    pub fn new(db: Database, markers: StatusMarkers) -> Self {
        Self { db, markers }
    }

    /// Replaces the record table with the records of one feed pass.
    ///
    /// The table is dropped and recreated first, then every record is inserted
    /// in one transaction. Duplicate ids keep the first occurrence. After the
    /// commit the indexes are built and the `last_refresh` and `record_count`
    /// markers are written.
    ///
    /// # Errors
    ///
    /// The first feed error aborts the refresh as [`StoreError::Feed`]; the
    /// insert transaction is rolled back and the record table stays empty.
    /// Database failures are returned as [`StoreError::Database`].
    #[instrument(skip(self, records))]
    pub async fn refresh<S>(&self, records: S) -> Result<RefreshSummary, StoreError>
    where
        S: Stream<Item = Result<Record, FeedError>>,
    {
        let pool = self.db.pool();
        let mut records = std::pin::pin!(records);

        sqlx::query("DROP TABLE IF EXISTS records")
            .execute(pool)
            .await?;
        sqlx::query(row::CREATE_RECORDS_TABLE).execute(pool).await?;
        debug!("record table recreated");

        let mut summary = RefreshSummary::default();
        let mut tx = pool.begin().await?;
        while let Some(record) = records.next().await {
            let record = record?;
            summary.read += 1;
            let result = row::bind_record(sqlx::query(row::INSERT_RECORD), &record)
                .execute(&mut *tx)
                .await?;
            summary.stored += result.rows_affected();
            if summary.read % PROGRESS_LOG_INTERVAL == 0 {
                debug!(read = summary.read, "refresh in progress");
            }
        }
        tx.commit().await?;

        for statement in row::CREATE_RECORD_INDEXES {
            sqlx::query(statement).execute(pool).await?;
        }

        self.markers.set(LAST_REFRESH, None).await?;
        self.markers
            .set(RECORD_COUNT, Some(&summary.stored.to_string()))
            .await?;

        info!(read = summary.read, stored = summary.stored, "refresh complete");
        Ok(summary)
    }

    /// Runs a compiled query and streams the matching records.
    ///
    /// The query must select every record column (all compiled searches do);
    /// rows that cannot be rebuilt into a [`Record`] yield an error.
    pub fn find<'a>(
        &'a self,
        query: &'a CompiledQuery,
    ) -> impl Stream<Item = Result<Record, StoreError>> + Send + 'a {
        debug!(query = %query, "running query");
        sqlx::query_as::<_, Record>(query.as_str())
            .fetch(self.db.pool())
            .map_err(StoreError::from)
    }

    /// Compiles `tokens` and collects the matching records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] for malformed tokens and
    /// [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn search<S: AsRef<str> + std::fmt::Debug>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<Record>, StoreError> {
        let query = query::compile(tokens)?;
        let records: Vec<Record> = self.find(&query).try_collect().await?;
        debug!(count = records.len(), "search complete");
        Ok(records)
    }

    /// Looks up one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(sqlx::query_as::<_, Record>("SELECT * FROM records WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?)
    }
}
