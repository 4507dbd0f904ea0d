//! Resolved settings and the opened store, ledger and markers for one command.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use fs2::FileExt;
use mtv_core::feed::DEFAULT_FEED_URL;
use mtv_core::{AgeDurationFilter, Database, Ledger, Quality, RecordStore, StatusMarkers, WriteLock};
use tracing::{debug, info};

use crate::app_config::{FileConfig, resolve_default_database_path};
use crate::cli::Cli;

const DEFAULT_QUALITY: Quality = Quality::Hd;

/// CLI flags merged over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) db_path: PathBuf,
    pub(crate) target_dir: PathBuf,
    pub(crate) quality: Quality,
    pub(crate) filter: AgeDurationFilter,
    pub(crate) feed_url: String,
}

impl Settings {
    pub(crate) fn resolve(cli: &Cli, file_config: &FileConfig) -> Self {
        let db_path = cli
            .db
            .clone()
            .or_else(|| file_config.database.clone())
            .unwrap_or_else(resolve_default_database_path);
        Self {
            db_path,
            target_dir: file_config
                .target_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            quality: file_config.quality.unwrap_or(DEFAULT_QUALITY),
            filter: AgeDurationFilter::new(
                file_config.max_age_days.unwrap_or(0),
                file_config.min_duration_minutes.unwrap_or(0),
            ),
            feed_url: file_config
                .feed_url
                .clone()
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        }
    }

    /// Directory holding the database, downloaded feeds and `filme.json`.
    pub(crate) fn data_dir(&self) -> PathBuf {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Everything a command needs, opened against one database.
pub(crate) struct AppContext {
    pub(crate) settings: Settings,
    pub(crate) store: RecordStore,
    pub(crate) ledger: Ledger,
    pub(crate) markers: StatusMarkers,
    db: Database,
    _writer_lock: Option<File>,
}

impl AppContext {
    /// Opens the database, taking the writer lock first when `writer` is set.
    pub(crate) async fn open(settings: Settings, writer: bool) -> Result<Self> {
        let data_dir = settings.data_dir();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory '{}'", data_dir.display()))?;

        let writer_lock = if writer {
            Some(acquire_writer_lock(&settings.db_path).await?)
        } else {
            None
        };

        let db = Database::new(&settings.db_path)
            .await
            .with_context(|| format!("Failed to open database '{}'", settings.db_path.display()))?;
        debug!(path = %settings.db_path.display(), "database opened");

        let lock = WriteLock::new();
        let markers = StatusMarkers::new(db.clone(), lock.clone());
        Ok(Self {
            store: RecordStore::new(db.clone(), markers.clone()),
            ledger: Ledger::new(db.clone(), lock),
            markers,
            settings,
            db,
            _writer_lock: writer_lock,
        })
    }

    pub(crate) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) async fn close(self) {
        self.db.close().await;
    }
}

/// Path of the advisory lock file guarding `db_path`.
pub(crate) fn lock_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Takes the exclusive writer lock, waiting for any other writer to finish.
pub(crate) async fn acquire_writer_lock(db_path: &Path) -> Result<File> {
    let path = lock_path(db_path);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .with_context(|| format!("Failed to open lock file '{}'", path.display()))?;

    if file.try_lock_exclusive().is_ok() {
        return Ok(file);
    }

    info!(path = %path.display(), "waiting for another mtv process to finish");
    tokio::task::spawn_blocking(move || file.lock_exclusive().map(|()| file))
        .await
        .context("Lock task failed")?
        .with_context(|| format!("Failed to lock '{}'", path.display()))
}
