//! Search and mark command handlers.

use anyhow::{Context, Result};
use mtv_core::Record;
use mtv_core::record::SELECTION_HEADER;
use tracing::info;

use super::select_by_position;
use crate::app::context::AppContext;
use crate::cli::{SearchArgs, SelectArgs};

pub async fn run_search_command(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let records = search(ctx, &args.tokens).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    print_numbered(&records);
    Ok(())
}

pub async fn run_mark_command(ctx: &AppContext, args: &SelectArgs) -> Result<()> {
    let selected = search_and_select(ctx, args).await?;
    if selected.is_empty() {
        println!("No matching records.");
        return Ok(());
    }

    let inserted = ctx
        .ledger
        .mark_pending(&selected, AppContext::today())
        .await
        .context("Failed to mark records")?;
    let already = (selected.len() as u64).saturating_sub(inserted);
    info!(inserted, already, "records marked");
    println!("Marked {inserted} records for download ({already} already marked).");
    Ok(())
}

pub(crate) async fn search_and_select(ctx: &AppContext, args: &SelectArgs) -> Result<Vec<Record>> {
    let records = search(ctx, &args.tokens).await?;
    select_by_position(&records, &args.pick)
}

async fn search(ctx: &AppContext, tokens: &[String]) -> Result<Vec<Record>> {
    ctx.store
        .search(tokens)
        .await
        .context("Search failed")
}

fn print_numbered(records: &[Record]) {
    if records.is_empty() {
        println!("No matching records.");
        return;
    }
    println!("{:>4}  {SELECTION_HEADER}", "#");
    println!("{}", "_".repeat(SELECTION_HEADER.len() + 6));
    for (index, record) in records.iter().enumerate() {
        println!("{:>4}  {}", index + 1, record.selection_line());
    }
}
