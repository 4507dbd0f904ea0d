//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mtv_core::{LedgerStatus, Quality};

/// Catalogue, search and download broadcast programs.
///
/// `mtv` loads the `MediathekView` feed into a local database, searches it
/// with keyword and free-text tokens and keeps a ledger of programs marked
/// for download.
#[derive(Parser, Debug)]
#[command(name = "mtv")]
#[command(author, version, about)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/mtv/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file (default: $XDG_DATA_HOME/mtv/filme.sqlite)
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the record store with a fresh copy of the feed
    Update(UpdateArgs),
    /// Search the record store
    Search(SearchArgs),
    /// Mark search results for a later download run
    Mark(SelectArgs),
    /// Download search results immediately, bypassing the ledger
    DownloadNow(DownloadNowArgs),
    /// Download every pending or failed ledger entry
    Download(DownloadArgs),
    /// Show ledger entries
    List(ListArgs),
    /// Remove ledger entries
    Unmark(UnmarkArgs),
    /// Show the last refresh and download run
    Status,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Feed source: auto, json, an http(s) URL or a file path
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Print matching records as JSON
    #[arg(long)]
    pub json: bool,

    /// Search tokens (key:value filters, free text, und/oder, parentheses)
    pub tokens: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// 1-based result numbers to select (default: all results)
    #[arg(long, value_delimiter = ',', value_name = "N,...")]
    pub pick: Vec<usize>,

    /// Search tokens
    pub tokens: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DownloadNowArgs {
    /// Requested quality: HD, SD or LOW
    #[arg(long)]
    pub quality: Option<Quality>,

    /// Directory to write downloads to
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    #[command(flatten)]
    pub select: SelectArgs,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Requested quality: HD, SD or LOW
    #[arg(long)]
    pub quality: Option<Quality>,

    /// Directory to write downloads to
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Statuses to show (default: all)
    #[arg(long, value_delimiter = ',', value_name = "STATUS,...")]
    pub status: Vec<LedgerStatus>,
}

#[derive(Args, Debug)]
pub struct UnmarkArgs {
    /// 1-based entry numbers as shown by `mtv list`
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "N,...",
        required_unless_present = "all"
    )]
    pub pick: Vec<usize>,

    /// Remove every ledger entry
    #[arg(long, conflicts_with = "pick")]
    pub all: bool,
}
