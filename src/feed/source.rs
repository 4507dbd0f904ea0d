//! Where a feed comes from and how its bytes reach the reconstructor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;
use xz2::read::XzDecoder;

use super::error::FeedError;
use super::reader::FeedReader;
use crate::download::HttpClient;
use crate::record::Record;

/// Published full feed, xz-compressed.
pub const DEFAULT_FEED_URL: &str = "https://liste.mediathekview.de/Filmliste-akt.xz";

/// File name of an uncompressed feed cached beside the database.
pub const CACHED_FEED_FILE: &str = "filme.json";

const DOWNLOADED_FEED_FILE: &str = "Filmliste-akt.xz";
const XZ_MAGIC: &[u8] = &[0xFD, b'7', b'z', b'X', b'Z', 0x00];
const READ_BUFFER_BYTES: usize = 256 * 1024;
const CHANNEL_CAPACITY: usize = 512;

/// A feed location selected on the command line or in the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Fetched over HTTP(S) into the data directory before reading.
    Remote(String),
    /// Read from a local file, xz-compressed or plain JSON.
    File(PathBuf),
}

impl FeedSource {
    /// Interprets a source argument.
    ///
    /// `auto` selects `default_url`, `json` selects [`CACHED_FEED_FILE`] in
    /// `data_dir`, an `http://` or `https://` prefix selects a remote feed and
    /// anything else is taken as a file path.
    #[must_use]
    pub fn parse(arg: &str, default_url: &str, data_dir: &Path) -> Self {
        let arg = arg.trim();
        if arg.eq_ignore_ascii_case("auto") {
            Self::Remote(default_url.to_string())
        } else if arg.eq_ignore_ascii_case("json") {
            Self::File(data_dir.join(CACHED_FEED_FILE))
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Remote(arg.to_string())
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Makes the feed available as a local file and returns its path.
    ///
    /// Remote feeds are downloaded into `data_dir`, replacing any earlier copy.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Download`] if fetching a remote feed fails.
    #[instrument(skip(client))]
    pub async fn materialize(
        &self,
        client: &HttpClient,
        data_dir: &Path,
    ) -> Result<PathBuf, FeedError> {
        match self {
            Self::File(path) => Ok(path.clone()),
            Self::Remote(url) => {
                let destination = data_dir.join(remote_file_name(url));
                info!(url = %url, path = %destination.display(), "fetching feed");
                let bytes = client.fetch_to_path(url, &destination).await?;
                debug!(bytes, "feed fetched");
                Ok(destination)
            }
        }
    }
}

fn remote_file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DOWNLOADED_FEED_FILE.to_string())
}

/// Opens a feed file for reading, transparently decompressing xz.
///
/// Compression is detected from the stream magic, not the file name.
///
/// # Errors
///
/// Returns [`FeedError::Open`] if the file cannot be opened and
/// [`FeedError::Io`] if its first bytes cannot be read.
pub fn open_feed_file(path: &Path) -> Result<Box<dyn BufRead + Send>, FeedError> {
    let file = File::open(path).map_err(|source| FeedError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffered = BufReader::with_capacity(READ_BUFFER_BYTES, file);
    if buffered.fill_buf()?.starts_with(XZ_MAGIC) {
        debug!(path = %path.display(), "reading xz-compressed feed");
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER_BYTES,
            XzDecoder::new(buffered),
        )))
    } else {
        Ok(Box::new(buffered))
    }
}

/// Reconstructs records from `reader` on a blocking worker.
///
/// The worker hands records over a bounded channel, so parsing never runs
/// more than a channel's worth ahead of the consumer. Dropping the stream
/// stops the worker at its next send. Must be called inside a Tokio runtime.
pub fn record_stream<R>(reader: R) -> impl Stream<Item = Result<Record, FeedError>> + Send
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let worker = tokio::task::spawn_blocking(move || {
        let emitted = FeedReader::from_reader(reader).for_each_record(|item| {
            if sender.blocking_send(item).is_err() {
                debug!("record consumer went away, stopping feed worker");
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });
        debug!(emitted, "feed worker finished");
    });

    let state: (mpsc::Receiver<Result<Record, FeedError>>, Option<JoinHandle<()>>) =
        (receiver, Some(worker));
    futures_util::stream::unfold(
        state,
        |(mut receiver, worker)| async move {
            if let Some(item) = receiver.recv().await {
                return Some((item, (receiver, worker)));
            }
            let worker = worker?;
            match worker.await {
                Ok(()) => None,
                Err(error) => {
                    warn!(error = %error, "feed worker failed");
                    Some((Err(FeedError::Task(error.to_string())), (receiver, None)))
                }
            }
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use futures_util::StreamExt;
    use tempfile::TempDir;
    use xz2::write::XzEncoder;

    use super::*;

    const FEED: &str = r#"{"Filmliste":["x"],"X":["ARD","Tatort","Der Fall","01.02.2023","20:15:00","01:30:00","800","","https://media.example.de/a.mp4","","","","","","","","","","DE","true"]}"#;

    #[test]
    fn test_parse_auto_uses_default_url() {
        let source = FeedSource::parse("auto", DEFAULT_FEED_URL, Path::new("/data"));
        assert_eq!(source, FeedSource::Remote(DEFAULT_FEED_URL.to_string()));
    }

    #[test]
    fn test_parse_json_uses_cached_file() {
        let source = FeedSource::parse("json", DEFAULT_FEED_URL, Path::new("/data"));
        assert_eq!(source, FeedSource::File(PathBuf::from("/data/filme.json")));
    }

    #[test]
    fn test_parse_url_and_path() {
        let remote = FeedSource::parse("https://host/list.xz", DEFAULT_FEED_URL, Path::new("."));
        assert_eq!(remote, FeedSource::Remote("https://host/list.xz".to_string()));
        let local = FeedSource::parse("feeds/list.json", DEFAULT_FEED_URL, Path::new("."));
        assert_eq!(local, FeedSource::File(PathBuf::from("feeds/list.json")));
    }

    #[test]
    fn test_remote_file_name_falls_back_for_bare_host() {
        assert_eq!(remote_file_name("https://host/lists/full.xz"), "full.xz");
        assert_eq!(remote_file_name("https://host/"), DOWNLOADED_FEED_FILE);
    }

    #[test]
    fn test_open_plain_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, FEED).unwrap();

        let records = FeedReader::from_reader(open_feed_file(&path).unwrap())
            .read_all()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Der Fall");
    }

    #[test]
    fn test_open_xz_compressed_feed_regardless_of_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.data");
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(FEED.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let records = FeedReader::from_reader(open_feed_file(&path).unwrap())
            .read_all()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_new);
    }

    #[test]
    fn test_open_missing_file_reports_path() {
        let result = open_feed_file(Path::new("/nonexistent/feed.json"));
        assert!(matches!(result, Err(FeedError::Open { .. })));
    }

    #[tokio::test]
    async fn test_record_stream_yields_records_then_ends() {
        let stream = record_stream(std::io::Cursor::new(FEED.as_bytes().to_vec()));
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().sender, "ARD");
    }

    #[tokio::test]
    async fn test_record_stream_forwards_errors() {
        let stream = record_stream(std::io::Cursor::new(b"[[\"ARD\"]".to_vec()));
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
