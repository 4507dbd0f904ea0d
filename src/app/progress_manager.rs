//! Progress UI (spinner) for feed refreshes and download runs.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use mtv_core::Record;
use mtv_core::download::ProgressHook;

const READ_MESSAGE_INTERVAL: u64 = 1_000;

/// A spinner on stderr, or a hidden bar when disabled.
pub(crate) struct ProgressUi {
    spinner: ProgressBar,
}

impl ProgressUi {
    pub(crate) fn new(enabled: bool) -> Self {
        if !enabled {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub(crate) fn set_message(&self, message: impl Into<String>) {
        self.spinner.set_message(message.into());
    }

    /// Updates the feed counter every [`READ_MESSAGE_INTERVAL`] records.
    pub(crate) fn records_read(&self, count: u64) {
        if count % READ_MESSAGE_INTERVAL == 0 {
            self.spinner
                .set_message(format!("Reading feed: {count} records..."));
        }
    }

    pub(crate) fn download_hook(&self) -> ProgressHook {
        let spinner = self.spinner.clone();
        Arc::new(move |current: usize, total: usize, record: &Record| {
            spinner.set_message(format!(
                "[{current}/{total}] Downloading {} | {}...",
                record.topic, record.title
            ));
        })
    }

    pub(crate) fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressUi;

    #[test]
    fn disabled_progress_ui_is_hidden() {
        let ui = ProgressUi::new(false);
        assert!(ui.spinner.is_hidden());
        ui.records_read(1_000);
        ui.finish();
    }
}
