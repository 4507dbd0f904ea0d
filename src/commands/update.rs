//! Update command handler: refresh the record store from the feed.

use anyhow::{Context, Result};
use futures_util::{TryStreamExt, future};
use mtv_core::feed::{FeedSource, open_feed_file, record_stream};
use mtv_core::HttpClient;
use tracing::info;

use crate::app::context::AppContext;
use crate::app::progress_manager::ProgressUi;
use crate::cli::UpdateArgs;

const AUTO_SOURCE: &str = "auto";

pub async fn run_update_command(
    ctx: &AppContext,
    args: &UpdateArgs,
    progress: &ProgressUi,
) -> Result<()> {
    let settings = &ctx.settings;
    let data_dir = settings.data_dir();
    let source = FeedSource::parse(
        args.source.as_deref().unwrap_or(AUTO_SOURCE),
        &settings.feed_url,
        &data_dir,
    );
    info!(source = ?source, "updating record store");

    progress.set_message("Fetching feed...");
    let client = HttpClient::new()?;
    let path = source
        .materialize(&client, &data_dir)
        .await
        .context("Failed to fetch the feed")?;
    let reader = open_feed_file(&path)?;

    let filter = settings.filter;
    let today = AppContext::today();
    let mut read = 0_u64;
    let records = record_stream(reader)
        .inspect_ok(|_| {
            read += 1;
            progress.records_read(read);
        })
        .try_filter(move |record| future::ready(filter.accepts(record, today)));

    let summary = ctx
        .store
        .refresh(records)
        .await
        .context("Failed to refresh the record store")?;
    progress.finish();

    println!(
        "Stored {} records ({} read from {}).",
        summary.stored,
        read,
        path.display()
    );
    Ok(())
}
