//! Terminal progress display for a run.

use std::time::Duration;

use contacts_engine::{PageEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.cyan} {msg} [{elapsed_precise}]";

/// Spinner showing pages fetched and records collected. The page count of a
/// listing is unknown up front, so no bar length is shown.
pub struct SpinnerProgressSink {
    bar: ProgressBar,
}

impl SpinnerProgressSink {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(format!("{label}: starting"));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self, succeeded: bool) {
        if succeeded {
            self.bar.finish();
        } else {
            self.bar.abandon();
        }
    }
}

impl ProgressSink for SpinnerProgressSink {
    fn emit(&self, event: PageEvent) {
        self.bar.set_message(format!(
            "page {} | {} pages, {} records",
            event.page, event.progress.pages_fetched, event.progress.records_collected
        ));
    }
}
