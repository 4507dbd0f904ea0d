//! Ingestion filter applied between the reconstructor and the store.

use chrono::{Days, NaiveDate};

use crate::record::Record;

/// Drops records that are too old or too short.
///
/// `max_age_days == 0` disables the age check and records without a date
/// always pass it. Records without a duration count as 24 hours long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeDurationFilter {
    /// Oldest accepted air date, in days before today.
    pub max_age_days: u32,
    /// Shortest accepted running time in minutes.
    pub min_duration_minutes: u32,
}

impl AgeDurationFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(max_age_days: u32, min_duration_minutes: u32) -> Self {
        Self {
            max_age_days,
            min_duration_minutes,
        }
    }

    /// Whether `record` should be stored, judged against `today`.
    #[must_use]
    pub fn accepts(&self, record: &Record, today: NaiveDate) -> bool {
        self.young_enough(record, today)
            && record.duration_or_max() >= self.min_duration_minutes
    }

    fn young_enough(&self, record: &Record, today: NaiveDate) -> bool {
        if self.max_age_days == 0 {
            return true;
        }
        let Some(date) = record.date else {
            return true;
        };
        today
            .checked_sub_days(Days::new(u64::from(self.max_age_days)))
            .is_none_or(|oldest| date >= oldest)
    }
}
