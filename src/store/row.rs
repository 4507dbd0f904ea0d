//! Mapping between [`Record`] and rows of the record table.

use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{FromRow, Row, Sqlite};

use crate::record::{ISO_DATE_FORMAT, ISO_TIME_FORMAT, Record};

/// Column definitions of the record table, in feed order plus `id`.
///
/// Must match the table created by the initial migration.
pub(crate) const CREATE_RECORDS_TABLE: &str = "CREATE TABLE records (
    sender          TEXT NOT NULL,
    topic           TEXT NOT NULL,
    title           TEXT NOT NULL,
    date            TEXT,
    time            TEXT,
    duration        INTEGER,
    size            INTEGER NOT NULL,
    description     TEXT NOT NULL,
    url             TEXT NOT NULL,
    website         TEXT NOT NULL,
    url_subtitle    TEXT NOT NULL,
    url_rtmp        TEXT NOT NULL,
    url_small       TEXT NOT NULL,
    url_rtmp_small  TEXT NOT NULL,
    url_hd          TEXT NOT NULL,
    url_rtmp_hd     TEXT NOT NULL,
    date_l          INTEGER,
    url_history     TEXT NOT NULL,
    geo             TEXT NOT NULL,
    is_new          INTEGER NOT NULL,
    id              TEXT PRIMARY KEY
)";

pub(crate) const CREATE_RECORD_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_records_id ON records(id)",
    "CREATE INDEX IF NOT EXISTS idx_records_sender ON records(sender)",
    "CREATE INDEX IF NOT EXISTS idx_records_topic ON records(topic)",
];

/// Duplicate ids keep the first row.
pub(crate) const INSERT_RECORD: &str = "INSERT OR IGNORE INTO records (
    sender, topic, title, date, time, duration, size, description, url, website,
    url_subtitle, url_rtmp, url_small, url_rtmp_small, url_hd, url_rtmp_hd,
    date_l, url_history, geo, is_new, id
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Binds every column of [`INSERT_RECORD`] in order.
pub(crate) fn bind_record<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q Record,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(record.sender.as_str())
        .bind(record.topic.as_str())
        .bind(record.title.as_str())
        .bind(record.date_iso())
        .bind(record.time_iso())
        .bind(record.duration.map(i64::from))
        .bind(i64::try_from(record.size).unwrap_or(i64::MAX))
        .bind(record.description.as_str())
        .bind(record.url.as_str())
        .bind(record.website.as_str())
        .bind(record.url_subtitle.as_str())
        .bind(record.url_rtmp.as_str())
        .bind(record.url_small.as_str())
        .bind(record.url_rtmp_small.as_str())
        .bind(record.url_hd.as_str())
        .bind(record.url_rtmp_hd.as_str())
        .bind(record.date_l)
        .bind(record.url_history.as_str())
        .bind(record.geo.as_str())
        .bind(record.is_new)
        .bind(record.id())
}

impl<'r> FromRow<'r, SqliteRow> for Record {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let date = row
            .try_get::<Option<String>, _>("date")?
            .filter(|text| !text.is_empty())
            .map(|text| {
                NaiveDate::parse_from_str(&text, ISO_DATE_FORMAT)
                    .map_err(|e| column_decode("date", e))
            })
            .transpose()?;
        let time = row
            .try_get::<Option<String>, _>("time")?
            .filter(|text| !text.is_empty())
            .map(|text| {
                NaiveTime::parse_from_str(&text, ISO_TIME_FORMAT)
                    .map_err(|e| column_decode("time", e))
            })
            .transpose()?;
        let duration = row
            .try_get::<Option<i64>, _>("duration")?
            .map(|minutes| u32::try_from(minutes).map_err(|e| column_decode("duration", e)))
            .transpose()?;
        let size = u64::try_from(row.try_get::<i64, _>("size")?)
            .map_err(|e| column_decode("size", e))?;

        Ok(Self {
            sender: row.try_get("sender")?,
            topic: row.try_get("topic")?,
            title: row.try_get("title")?,
            date,
            time,
            duration,
            size,
            description: row.try_get("description")?,
            url: row.try_get("url")?,
            website: row.try_get("website")?,
            url_subtitle: row.try_get("url_subtitle")?,
            url_rtmp: row.try_get("url_rtmp")?,
            url_small: row.try_get("url_small")?,
            url_rtmp_small: row.try_get("url_rtmp_small")?,
            url_hd: row.try_get("url_hd")?,
            url_rtmp_hd: row.try_get("url_rtmp_hd")?,
            date_l: row.try_get("date_l")?,
            url_history: row.try_get("url_history")?,
            geo: row.try_get("geo")?,
            is_new: row.try_get("is_new")?,
        })
    }
}

fn column_decode(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}
