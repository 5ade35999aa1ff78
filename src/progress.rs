//! Progress display for long collaborator calls
//!
//! Provides a spinner on stderr using indicatif while the repository is
//! cloned and the registry is queried. Narrated runs print their own
//! progress lines instead.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown while a run waits on a collaborator
pub struct Progress {
    /// Whether progress display is enabled
    enabled: bool,
    /// Current spinner
    bar: Mutex<Option<ProgressBar>>,
}

impl Progress {
    /// Create a new progress display
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    /// Create a disabled progress display
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Returns true if the spinner is drawn at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show a spinner with a message, replacing any current one
    pub fn spinner(&self, message: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        match ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            Ok(style) => spinner.set_style(style),
            Err(e) => log::debug!("falling back to default spinner style: {}", e),
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut bar) = self.bar.lock() {
            if let Some(previous) = bar.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }

    /// Update the message
    pub fn set_message(&self, message: &str) {
        if let Ok(bar) = self.bar.lock() {
            if let Some(ref bar) = *bar {
                bar.set_message(message.to_string());
            }
        }
    }

    /// Finish and clear the current spinner
    pub fn finish_and_clear(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_disabled() {
        let progress = Progress::disabled();
        progress.spinner("cloning");
        progress.set_message("still cloning");
        progress.finish_and_clear();
        assert!(!progress.is_enabled());
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_progress_enabled() {
        let progress = Progress::new(true);
        progress.spinner("checking serde");
        progress.set_message("checking tokio");
        progress.spinner("checking anyhow");
        progress.finish_and_clear();
        assert!(progress.bar.lock().unwrap().is_none());
    }
}
