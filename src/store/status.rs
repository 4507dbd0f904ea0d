//! Status markers: small keyed facts about past runs.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, instrument};

use super::error::StoreError;
use crate::db::{Database, WriteLock};

/// Time of the last completed feed refresh.
pub const LAST_REFRESH: &str = "last_refresh";

/// Number of records stored by the last refresh.
pub const RECORD_COUNT: &str = "record_count";

/// Time of the last ledger download run.
pub const LAST_DOWNLOAD: &str = "last_download";

/// One stored marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMarker {
    /// Marker key.
    pub key: String,
    /// When the marker was last written.
    pub timestamp: DateTime<Utc>,
    /// Optional payload.
    pub text: Option<String>,
}

/// Reads and upserts status markers.
///
/// Writes go through the shared [`WriteLock`].
#[derive(Debug, Clone)]
pub struct StatusMarkers {
    db: Database,
    lock: WriteLock,
}

impl StatusMarkers {
    /// Creates a marker table handle.
    #[must_use]
    pub fn new(db: Database, lock: WriteLock) -> Self {
        Self { db, lock }
    }

    /// Sets `key` to `text`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the upsert fails.
    pub async fn set(&self, key: &str, text: Option<&str>) -> Result<(), StoreError> {
        self.set_at(key, text, Utc::now()).await
    }

    /// Sets `key` to `text` with an explicit timestamp, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the upsert fails.
    #[instrument(skip(self))]
    pub async fn set_at(
        &self,
        key: &str,
        text: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.acquire().await;
        sqlx::query(
            "INSERT INTO status (key, timestamp, text) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET timestamp = excluded.timestamp, text = excluded.text",
        )
        .bind(key)
        .bind(timestamp.to_rfc3339())
        .bind(text)
        .execute(self.db.pool())
        .await?;
        debug!("status marker written");
        Ok(())
    }

    /// Returns the stored markers among `keys`, ordered by key.
    ///
    /// Keys without a marker are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails and
    /// [`StoreError::InvalidMarker`] if a stored timestamp is unreadable.
    #[instrument(skip(self))]
    pub async fn get(&self, keys: &[&str]) -> Result<Vec<StatusMarker>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT key, timestamp, text FROM status WHERE key IN (");
        let mut separated = builder.separated(", ");
        for key in keys {
            separated.push_bind(*key);
        }
        separated.push_unseparated(") ORDER BY key");

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.into_iter()
            .map(|row| -> Result<StatusMarker, StoreError> {
                let key: String = row.try_get("key")?;
                let stamp: String = row.try_get("timestamp")?;
                let timestamp = DateTime::parse_from_rfc3339(&stamp)
                    .map_err(|e| StoreError::InvalidMarker {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?
                    .with_timezone(&Utc);
                Ok(StatusMarker {
                    key,
                    timestamp,
                    text: row.try_get("text")?,
                })
            })
            .collect()
    }
}
