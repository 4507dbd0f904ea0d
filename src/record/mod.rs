//! Program records reconstructed from the broadcast feed.
//!
//! A [`Record`] is one program entry: who broadcast it, what it is about, when
//! it aired and where the media lives. Records are values; they are built once
//! from the feed's 20 positional strings and never mutated afterwards.
//!
//! # Identity
//!
//! [`Record::id`] is a SHA-256 digest over sender, topic, title, date, time and
//! primary URL. The id is derived from content, so it stays stable across
//! daily feed refreshes and is the key shared by the record store and the
//! download ledger.

mod error;
mod quality;

use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub use error::RecordParseError;
pub use quality::Quality;

/// Number of positional scalars in one feed record.
pub const FIELD_COUNT: usize = 20;

/// Minutes reported for records whose duration is unknown, so they are never
/// filtered out as too short.
pub const UNKNOWN_DURATION_MINUTES: u32 = 24 * 60;

const FEED_DATE_FORMAT: &str = "%d.%m.%Y";
const FEED_TIME_FORMAT: &str = "%H:%M:%S";

/// Date layout used for storage, ids and query comparisons.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Time layout used for storage and ids.
pub const ISO_TIME_FORMAT: &str = "%H:%M:%S";

/// Column header matching [`Record::selection_line`].
pub const SELECTION_HEADER: &str = "Sender   | Topic                | Date       | Min. | Title";

/// One broadcast program entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Broadcasting station (e.g. "ARD").
    pub sender: String,
    /// Series or topic the program belongs to.
    pub topic: String,
    /// Program title.
    pub title: String,
    /// Air date.
    pub date: Option<NaiveDate>,
    /// Air time.
    pub time: Option<NaiveTime>,
    /// Running time in whole minutes.
    pub duration: Option<u32>,
    /// Size as published by the feed.
    pub size: u64,
    /// Free-text description.
    pub description: String,
    /// Primary (SD) media URL.
    pub url: String,
    /// Program web page.
    pub website: String,
    /// Subtitle file URL.
    pub url_subtitle: String,
    /// RTMP variant of the primary URL.
    pub url_rtmp: String,
    /// Small-quality variant, encoded as `"<offset>|<suffix>"`.
    pub url_small: String,
    /// RTMP variant of the small-quality URL.
    pub url_rtmp_small: String,
    /// HD variant, encoded as `"<offset>|<suffix>"`.
    pub url_hd: String,
    /// RTMP variant of the HD URL.
    pub url_rtmp_hd: String,
    /// Legacy numeric date (epoch seconds).
    pub date_l: Option<i64>,
    /// History URL.
    pub url_history: String,
    /// Geo-restriction code.
    pub geo: String,
    /// Whether the feed flags the entry as new.
    pub is_new: bool,
}

impl Record {
    /// Builds a record from the feed's positional strings.
    ///
    /// Empty strings become absent values. Scalars beyond [`FIELD_COUNT`] are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecordParseError`] if fewer than [`FIELD_COUNT`] fields are
    /// given or a date, time, duration or number field is malformed.
    pub fn from_fields(fields: Vec<String>) -> Result<Self, RecordParseError> {
        if fields.len() < FIELD_COUNT {
            return Err(RecordParseError::FieldCount {
                found: fields.len(),
                expected: FIELD_COUNT,
            });
        }
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let sender = next();
        let topic = next();
        let title = next();
        let date = parse_feed_date("date", &next())?;
        let time = parse_feed_time("time", &next())?;
        let duration = parse_feed_duration("duration", &next())?;
        let size = parse_size(&next())?;
        let description = next();
        let url = next();
        let website = next();
        let url_subtitle = next();
        let url_rtmp = next();
        let url_small = next();
        let url_rtmp_small = next();
        let url_hd = next();
        let url_rtmp_hd = next();
        let date_l = parse_optional_i64("date_l", &next())?;
        let url_history = next();
        let geo = next();
        let is_new = next() == "true";

        Ok(Self {
            sender,
            topic,
            title,
            date,
            time,
            duration,
            size,
            description,
            url,
            website,
            url_subtitle,
            url_rtmp,
            url_small,
            url_rtmp_small,
            url_hd,
            url_rtmp_hd,
            date_l,
            url_history,
            geo,
            is_new,
        })
    }

    /// Fills an empty sender or topic from the previously emitted record.
    ///
    /// The feed only repeats sender and topic when they change, so every
    /// record after the first inherits them from its predecessor. Without a
    /// predecessor the record is returned unchanged, even if the fields are
    /// empty.
    #[must_use]
    pub fn inherit_from(mut self, previous: Option<&Record>) -> Self {
        let Some(previous) = previous else {
            return self;
        };
        if self.sender.is_empty() {
            self.sender.clone_from(&previous.sender);
        }
        if self.topic.is_empty() {
            self.topic.clone_from(&previous.topic);
        }
        self
    }

    /// Returns the content hash identifying this record across refreshes.
    #[must_use]
    pub fn id(&self) -> String {
        let date = self.date_iso().unwrap_or_default();
        let time = self.time_iso().unwrap_or_default();
        let key = [
            self.sender.as_str(),
            self.topic.as_str(),
            self.title.as_str(),
            date.as_str(),
            time.as_str(),
            self.url.as_str(),
        ]
        .join(",");
        format!("{:x}", Sha256::digest(key.as_bytes()))
    }

    /// Air date as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_iso(&self) -> Option<String> {
        self.date.map(|d| d.format(ISO_DATE_FORMAT).to_string())
    }

    /// Air time as `HH:MM:SS`.
    #[must_use]
    pub fn time_iso(&self) -> Option<String> {
        self.time.map(|t| t.format(ISO_TIME_FORMAT).to_string())
    }

    /// Duration in minutes, or [`UNKNOWN_DURATION_MINUTES`] when unknown.
    #[must_use]
    pub fn duration_or_max(&self) -> u32 {
        self.duration.unwrap_or(UNKNOWN_DURATION_MINUTES)
    }

    /// Picks the media URL for the requested quality.
    ///
    /// Returns the quality actually delivered together with the URL. The
    /// delivered quality may be lower than requested; callers are expected to
    /// compare and log rather than fail. This never fails: a variant that
    /// cannot be decoded falls back to the primary URL.
    #[must_use]
    pub fn resolve_url(&self, requested: Quality) -> (Quality, String) {
        if requested == Quality::Sd || self.url_hd.is_empty() {
            return (Quality::Sd, self.url.clone());
        }

        let (tier, variant) = if requested == Quality::Hd {
            (Quality::Hd, &self.url_hd)
        } else {
            (Quality::Low, &self.url_small)
        };

        match splice_variant(&self.url, variant) {
            Some(url) => (tier, url),
            None => (Quality::Sd, self.url.clone()),
        }
    }

    /// One line of a selection listing: `sender | topic | date | minutes | title`.
    #[must_use]
    pub fn selection_line(&self) -> String {
        format!(
            "{:<8} | {:<20} | {:<10} | {:>4} | {}",
            self.sender,
            self.topic,
            self.date_iso().unwrap_or_default(),
            self.duration_or_max(),
            self.title
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.sender, self.topic, self.title)?;
        if let Some(date) = self.date_iso() {
            write!(f, " ({date})")?;
        }
        Ok(())
    }
}

/// Decodes a `"<offset>|<suffix>"` variant against the primary URL.
fn splice_variant(base: &str, variant: &str) -> Option<String> {
    let (offset, suffix) = variant.split_once('|')?;
    let offset: usize = offset.trim().parse().ok()?;
    let prefix = base.get(..offset.min(base.len()))?;
    Some(format!("{prefix}{suffix}"))
}

fn parse_feed_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, RecordParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, FEED_DATE_FORMAT)
        .map(Some)
        .map_err(|_| RecordParseError::invalid_date(field, raw))
}

fn parse_feed_time(field: &'static str, raw: &str) -> Result<Option<NaiveTime>, RecordParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(raw, FEED_TIME_FORMAT)
        .map(Some)
        .map_err(|_| RecordParseError::invalid_time(field, raw))
}

fn parse_feed_duration(field: &'static str, raw: &str) -> Result<Option<u32>, RecordParseError> {
    Ok(parse_feed_time(field, raw)?.map(|t| t.hour() * 60 + t.minute()))
}

fn parse_size(raw: &str) -> Result<u64, RecordParseError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.trim()
        .parse()
        .map_err(|_| RecordParseError::invalid_number("size", raw))
}

fn parse_optional_i64(field: &'static str, raw: &str) -> Result<Option<i64>, RecordParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| RecordParseError::invalid_number(field, raw))
}
