//! Download command handlers: immediate downloads and ledger runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mtv_core::{DownloadRunner, DownloadStats, HttpClient, Quality};

use super::search::search_and_select;
use crate::app::context::AppContext;
use crate::app::progress_manager::ProgressUi;
use crate::cli::{DownloadArgs, DownloadNowArgs};

pub async fn run_download_now_command(
    ctx: &AppContext,
    args: &DownloadNowArgs,
    progress: &ProgressUi,
) -> Result<()> {
    let selected = search_and_select(ctx, &args.select).await?;
    if selected.is_empty() {
        println!("No matching records.");
        return Ok(());
    }

    let runner = build_runner(ctx, args.quality, args.target_dir.as_deref(), progress)?;
    let stats = runner.download_now(&selected).await;
    progress.finish();

    print_stats(stats, runner.target_dir());
    Ok(())
}

pub async fn run_download_command(
    ctx: &AppContext,
    args: &DownloadArgs,
    progress: &ProgressUi,
) -> Result<()> {
    let runner = build_runner(ctx, args.quality, args.target_dir.as_deref(), progress)?;
    let stats = runner
        .download_marked(&ctx.ledger, &ctx.markers)
        .await
        .context("Download run failed")?;
    progress.finish();

    if stats.total() == 0 {
        println!("Nothing to download.");
    } else {
        print_stats(stats, runner.target_dir());
    }
    Ok(())
}

fn build_runner(
    ctx: &AppContext,
    quality: Option<Quality>,
    target_dir: Option<&Path>,
    progress: &ProgressUi,
) -> Result<DownloadRunner<HttpClient>> {
    let target_dir: PathBuf = target_dir.map_or_else(|| ctx.settings.target_dir.clone(), Path::to_path_buf);
    fs::create_dir_all(&target_dir).with_context(|| {
        format!("Failed to create target directory '{}'", target_dir.display())
    })?;

    let quality = quality.unwrap_or(ctx.settings.quality);
    Ok(DownloadRunner::new(HttpClient::new()?, target_dir, quality)
        .with_progress(progress.download_hook()))
}

fn print_stats(stats: DownloadStats, target_dir: &Path) {
    println!(
        "{} downloaded, {} failed (target: {}).",
        stats.completed,
        stats.failed,
        target_dir.display()
    );
}
