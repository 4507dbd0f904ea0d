//! CLI command handlers.

mod download;
mod ledger;
mod search;
mod status;
mod update;

pub use download::{run_download_command, run_download_now_command};
pub use ledger::{run_list_command, run_unmark_command};
pub use search::{run_mark_command, run_search_command};
pub use status::run_status_command;
pub use update::run_update_command;

use anyhow::{Result, bail};

/// Keeps the 1-based positions in `pick`, or everything when `pick` is empty.
pub(crate) fn select_by_position<T: Clone>(items: &[T], pick: &[usize]) -> Result<Vec<T>> {
    if pick.is_empty() {
        return Ok(items.to_vec());
    }
    let mut selected = Vec::with_capacity(pick.len());
    for &position in pick {
        let Some(item) = position.checked_sub(1).and_then(|index| items.get(index)) else {
            bail!(
                "No entry number {position}; expected a number between 1 and {}",
                items.len()
            );
        };
        selected.push(item.clone());
    }
    Ok(selected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::select_by_position;

    #[test]
    fn test_select_without_pick_keeps_all() {
        assert_eq!(select_by_position(&["a", "b"], &[]).unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_select_is_one_based_and_ordered_by_pick() {
        assert_eq!(
            select_by_position(&["a", "b", "c"], &[3, 1]).unwrap(),
            ["c", "a"]
        );
    }

    #[test]
    fn test_select_rejects_zero_and_out_of_range() {
        let err = select_by_position(&["a"], &[0]).unwrap_err();
        assert!(err.to_string().contains("No entry number 0"));
        let err = select_by_position(&["a"], &[2]).unwrap_err();
        assert!(err.to_string().contains("between 1 and 1"));
    }
}
