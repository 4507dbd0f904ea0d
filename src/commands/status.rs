//! Status command handler: show the operational markers.

use anyhow::{Context, Result};
use mtv_core::StatusMarker;
use mtv_core::store::{LAST_DOWNLOAD, LAST_REFRESH, RECORD_COUNT};

use crate::app::context::AppContext;

const MARKER_KEYS: [&str; 3] = [LAST_REFRESH, RECORD_COUNT, LAST_DOWNLOAD];

pub async fn run_status_command(ctx: &AppContext) -> Result<()> {
    let markers = ctx
        .markers
        .get(&MARKER_KEYS)
        .await
        .context("Failed to read status markers")?;

    println!("Database: {}", ctx.settings.db_path.display());
    for key in MARKER_KEYS {
        match markers.iter().find(|marker| marker.key == key) {
            Some(marker) => println!("{}", marker_line(marker)),
            None => println!("{key}: never"),
        }
    }
    Ok(())
}

fn marker_line(marker: &StatusMarker) -> String {
    let timestamp = marker.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
    match marker.text.as_deref() {
        Some(text) => format!("{}: {text} ({timestamp})", marker.key),
        None => format!("{}: {timestamp}", marker.key),
    }
}
