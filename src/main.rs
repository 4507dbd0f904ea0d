//! CLI entry point for mtv.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app;
mod app_config;
mod cli;
mod commands;

use app::context::{AppContext, Settings};
use app::progress_manager::ProgressUi;
use app::terminal;
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let file_config = app_config::load_file_config(cli.config.as_deref())?;
    terminal::init_tracing(terminal::resolve_default_log_level(&cli, &file_config));
    debug!(?cli, "CLI arguments parsed");

    let settings = Settings::resolve(&cli, &file_config);
    let writer = is_writer(&cli.command);
    let ctx = AppContext::open(settings, writer).await?;
    let progress = ProgressUi::new(terminal::spinner_enabled(&cli));

    let result = match &cli.command {
        Command::Update(args) => commands::run_update_command(&ctx, args, &progress).await,
        Command::Search(args) => commands::run_search_command(&ctx, args).await,
        Command::Mark(args) => commands::run_mark_command(&ctx, args).await,
        Command::DownloadNow(args) => {
            commands::run_download_now_command(&ctx, args, &progress).await
        }
        Command::Download(args) => commands::run_download_command(&ctx, args, &progress).await,
        Command::List(args) => commands::run_list_command(&ctx, args).await,
        Command::Unmark(args) => commands::run_unmark_command(&ctx, args).await,
        Command::Status => commands::run_status_command(&ctx).await,
    };
    progress.finish();
    ctx.close().await;
    result
}

/// Commands that write to the database run under the advisory writer lock.
fn is_writer(command: &Command) -> bool {
    matches!(
        command,
        Command::Update(_) | Command::Mark(_) | Command::Download(_) | Command::Unmark(_)
    )
}
