//! Progress reporting for mutation runs using indicatif.
//!
//! The pipeline emits [`ProgressEvent`]s through a callback; the CLI turns
//! them into a spinner for the setup stages and a bar while mutants run.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use serde::Serialize;

/// Style templates for the bars used during a run.
pub mod styles {
    use super::*;

    /// Bar shown while mutants are deployed and tested.
    pub fn mutant_progress() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("valid template")
            .progress_chars("#>-")
    }

    /// Spinner style for indeterminate stages.
    pub fn spinner() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template")
    }
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    FetchSource,
    DiscoverTypes,
    VerifyClass,
    VerifyTestClass,
    Coverage,
    Generate,
    Mutant,
    Rollback,
    Done,
}

/// One progress notification.
///
/// `index` and `total` are only meaningful for [`ProgressStage::Mutant`],
/// where `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    pub index: usize,
    pub total: usize,
    pub message: String,
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Check if stderr is a TTY (for deciding whether to show progress bars).
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Renders progress events on stderr.
#[derive(Clone)]
pub struct ProgressReporter {
    hidden: bool,
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl ProgressReporter {
    /// Reporter that draws only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            hidden: !is_tty(),
            bar: Arc::new(Mutex::new(None)),
        }
    }

    /// Reporter that never draws.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            bar: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle one event.
    pub fn handle(&self, event: ProgressEvent) {
        let mut slot = self.bar.lock();
        match event.stage {
            ProgressStage::Mutant => {
                let needs_bar = slot.as_ref().is_none_or(|bar| bar.length().is_none());
                if needs_bar {
                    if let Some(spinner) = slot.take() {
                        spinner.finish_and_clear();
                    }
                    *slot = Some(self.mutant_bar(event.total));
                }
                if let Some(bar) = slot.as_ref() {
                    bar.set_position(event.index as u64);
                    bar.set_message(event.message);
                }
            }
            ProgressStage::Done => {
                if let Some(bar) = slot.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {
                let is_spinner = slot.as_ref().is_some_and(|bar| bar.length().is_none());
                if !is_spinner {
                    if let Some(bar) = slot.take() {
                        bar.finish_and_clear();
                    }
                    *slot = Some(self.spinner());
                }
                if let Some(bar) = slot.as_ref() {
                    bar.set_message(event.message);
                }
            }
        }
    }

    /// Turn the reporter into a pipeline callback.
    pub fn callback(&self) -> ProgressCallback {
        let reporter = self.clone();
        Box::new(move |event| reporter.handle(event))
    }

    /// Clear anything still drawn.
    pub fn finish(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
    }

    /// Position of the mutant bar, if one is active.
    pub fn position(&self) -> Option<u64> {
        self.bar
            .lock()
            .as_ref()
            .filter(|bar| bar.length().is_some())
            .map(|bar| bar.position())
    }

    fn mutant_bar(&self, total: usize) -> ProgressBar {
        let bar = if self.hidden {
            let bar = ProgressBar::hidden();
            bar.set_length(total as u64);
            bar
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(styles::mutant_progress());
        bar
    }

    fn spinner(&self) -> ProgressBar {
        if self.hidden {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(styles::spinner());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
