//! Progress reporting.
//!
//! Long running operations take a `&dyn Progress` instead of drawing anything themselves,
//! which keeps them usable (and testable) without a terminal.
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

/// Receives `(current, total, message)` updates. Purely observational.
pub trait Progress {
    fn update(&self, current: u64, total: u64, message: &str);

    /// Called once the operation is done.
    fn finish(&self) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&self, _current: u64, _total: u64, _message: &str) {}
}

/// Forwards updates to the `debug` log level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn update(&self, current: u64, total: u64, message: &str) {
        debug!("[{current}/{total}] {message}");
    }
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(prefix: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        bar.set_prefix(prefix.to_string());
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn update(&self, current: u64, total: u64, message: &str) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
