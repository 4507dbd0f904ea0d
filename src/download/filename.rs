//! Target file naming for downloaded programs.

use url::Url;

use super::constants::DEFAULT_EXTENSION;
use crate::record::Record;

/// Builds `<sender>_<date>_<topic>_<title>.<ext>` for `record`.
///
/// `/` in any component becomes `_`. The extension comes from the path of
/// `media_url`, the URL actually fetched.
#[must_use]
pub fn target_file_name(record: &Record, media_url: &str) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        strip_separators(&record.sender),
        record.date_iso().unwrap_or_default(),
        strip_separators(&record.topic),
        strip_separators(&record.title),
        extension_from_url(media_url),
    )
}

fn strip_separators(value: &str) -> String {
    value.replace('/', "_")
}

/// Lowercased extension of the URL path's last segment.
#[must_use]
pub fn extension_from_url(url: &str) -> String {
    let last_segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });
    last_segment
        .as_deref()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(sender: &str, topic: &str, title: &str, date: Option<NaiveDate>) -> Record {
        Record {
            sender: sender.to_string(),
            topic: topic.to_string(),
            title: title.to_string(),
            date,
            time: None,
            duration: None,
            size: 0,
            description: String::new(),
            url: String::new(),
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

    #[test]
    fn test_target_file_name_layout() {
        let record = record(
            "ARD",
            "Tatort",
            "Der Fall",
            NaiveDate::from_ymd_opt(2023, 2, 1),
        );
        assert_eq!(
            target_file_name(&record, "https://media.example.de/video/tatort.MP4"),
            "ARD_2023-02-01_Tatort_Der Fall.mp4"
        );
    }

    #[test]
    fn test_target_file_name_replaces_slashes() {
        let record = record("ARD/One", "Krimi/Thriller", "a/b", None);
        assert_eq!(
            target_file_name(&record, "https://media.example.de/x.webm"),
            "ARD_One__Krimi_Thriller_a_b.webm"
        );
    }

    #[test]
    fn test_extension_ignores_query_string() {
        assert_eq!(
            extension_from_url("https://media.example.de/clip.m3u8?token=abc.def"),
            "m3u8"
        );
    }

    #[test]
    fn test_extension_falls_back_to_default() {
        assert_eq!(extension_from_url("https://media.example.de/stream"), "mp4");
        assert_eq!(extension_from_url("not a url"), "mp4");
        assert_eq!(extension_from_url("https://media.example.de/"), "mp4");
    }
}
