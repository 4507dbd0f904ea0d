//! List and unmark command handlers.

use anyhow::{Context, Result};
use mtv_core::record::SELECTION_HEADER;
use mtv_core::{LedgerEntry, LedgerItem, LedgerStatus};

use super::select_by_position;
use crate::app::context::AppContext;
use crate::cli::{ListArgs, UnmarkArgs};

pub async fn run_list_command(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let statuses: &[LedgerStatus] = if args.status.is_empty() {
        &LedgerStatus::ALL
    } else {
        &args.status
    };
    let items = ctx
        .ledger
        .list_entries(statuses)
        .await
        .context("Failed to read the download ledger")?;

    if items.is_empty() {
        println!("No ledger entries.");
        return Ok(());
    }
    println!("{:>4}  {:<8} | {:<10} | {SELECTION_HEADER}", "#", "Status", "Since");
    for (index, item) in items.iter().enumerate() {
        println!("{:>4}  {}", index + 1, item_line(item));
    }
    Ok(())
}

pub async fn run_unmark_command(ctx: &AppContext, args: &UnmarkArgs) -> Result<()> {
    let entries: Vec<LedgerEntry> = ctx
        .ledger
        .list_entries(&LedgerStatus::ALL)
        .await
        .context("Failed to read the download ledger")?
        .into_iter()
        .map(|item| item.entry)
        .collect();
    let selected = if args.all {
        entries
    } else {
        select_by_position(&entries, &args.pick)?
    };

    let removed = ctx
        .ledger
        .remove_entries(&selected)
        .await
        .context("Failed to remove ledger entries")?;
    println!("Removed {removed} ledger entries.");
    Ok(())
}

fn item_line(item: &LedgerItem) -> String {
    let subject = match &item.record {
        Some(record) => record.selection_line(),
        None => format!("(no longer in the film list) {}", item.entry.id),
    };
    format!(
        "{:<8} | {} | {subject}",
        item.entry.status.as_str(),
        item.entry.status_date,
    )
}
