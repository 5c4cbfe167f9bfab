//! Progress reporting for the panel/layer aggregation loop.
//!
//! The bar is drawn on stderr only when stderr is an interactive terminal,
//! so piped output and test runs stay clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};

/// Check if we should show progress indicators.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a determinate progress bar, hidden when `show` is false.
///
/// # Example
/// ```ignore
/// let pb = create_progress_bar(jobs as u64, "Aggregating", should_show_progress());
/// for job in 0..jobs {
///     pb.set_message(format!("panel {job}"));
///     pb.inc(1);
/// }
/// pb.finish_and_clear();
/// ```
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=>-"));
        pb.set_style(style);
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Progress over aggregation jobs (one job = one panel layer).
pub struct JobProgress {
    bar: ProgressBar,
    showing: bool,
}

impl JobProgress {
    /// Track `total` jobs, drawing only on an interactive stderr.
    #[must_use]
    pub fn new(total: usize, message: &str) -> Self {
        Self::with_visibility(total, message, should_show_progress())
    }

    /// Track `total` jobs with explicit visibility.
    #[must_use]
    pub fn with_visibility(total: usize, message: &str, show: bool) -> Self {
        Self {
            bar: create_progress_bar(total as u64, message, show),
            showing: show,
        }
    }

    /// Mark one job done, labelling the next.
    pub fn advance(&self, label: &str) {
        if self.showing {
            self.bar.set_message(label.to_string());
        }
        self.bar.inc(1);
    }

    /// Jobs completed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
