//! Terminal progress display, one bar per clone phase

use super::phase::{Operation, PhaseCode, ProgressListener};
use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const KNOWN_TOTAL_TEMPLATE: &str =
    "{spinner:.green} {prefix:<16} [{bar:40.cyan/blue}] {percent:>3}% eta {eta:<4} {msg}";
const UNKNOWN_TOTAL_TEMPLATE: &str = "{spinner:.green} {prefix:<16} {pos:>10} {msg}";

fn bar_style(known_total: bool) -> ProgressStyle {
    let template = if known_total { KNOWN_TOTAL_TEMPLATE } else { UNKNOWN_TOTAL_TEMPLATE };
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn finished_style(message: &str) -> String {
    Style::new().dim().force_styling(true).apply_to(message).to_string()
}

/// A single phase's bar and its completion state
pub struct PhaseTask {
    operation: Operation,
    bar: ProgressBar,
    finished: bool,
}

impl PhaseTask {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn title(&self) -> String {
        self.bar.prefix()
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn update(&mut self, current: u64, total: Option<u64>, message: &str) {
        if let Some(total) = total {
            if self.bar.length() != Some(total) {
                if self.bar.length().is_none() {
                    self.bar.set_style(bar_style(true));
                }
                self.bar.set_length(total);
            }
        }
        self.bar.set_position(current);
        self.bar.set_message(message.to_string());
    }

    fn finish(&mut self, message: &str) {
        self.bar.finish_with_message(finished_style(message));
        self.finished = true;
    }

    /// Finalize without jumping the bar to its full length.
    fn close_early(&mut self) {
        let message = finished_style(&self.bar.message());
        self.bar.abandon_with_message(message);
        self.finished = true;
    }
}

/// Renders clone phases as a stack of progress bars.
///
/// Completed phases stay on screen. Dropping the reporter abandons any bar
/// still in flight so the terminal is left in a clean state.
pub struct ProgressReporter {
    multi: MultiProgress,
    tasks: Vec<PhaseTask>,
}

impl ProgressReporter {
    /// Reporter drawing to stderr
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Reporter that tracks state without drawing anything
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self { multi: MultiProgress::with_draw_target(target), tasks: Vec::new() }
    }

    pub fn tasks(&self) -> &[PhaseTask] {
        &self.tasks
    }

    fn active_mut(&mut self) -> Option<&mut PhaseTask> {
        self.tasks.last_mut().filter(|task| !task.finished)
    }

    fn begin(&mut self, operation: Operation, total: Option<u64>) {
        if let Some(previous) = self.active_mut() {
            tracing::warn!(
                "{} began while {} was still active; closing it",
                operation,
                previous.operation
            );
            previous.close_early();
        }

        let bar = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::no_length(),
        };
        let bar = self.multi.add(bar);
        bar.set_style(bar_style(total.is_some()));
        bar.set_prefix(operation.title());

        tracing::debug!("Phase started: {}", operation);
        self.tasks.push(PhaseTask { operation, bar, finished: false });
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener for ProgressReporter {
    fn on_phase_event(
        &mut self,
        code: PhaseCode,
        current: u64,
        total: Option<u64>,
        message: &str,
    ) {
        let Some(operation) = code.operation() else {
            tracing::warn!("Ignoring progress event with unknown phase code {:#x}", code.0);
            return;
        };

        if code.is_begin() {
            self.begin(operation, total);
        }

        let Some(task) = self.active_mut() else {
            tracing::warn!("Ignoring {} progress with no active phase", operation);
            return;
        };
        if task.operation != operation {
            tracing::warn!(
                "Ignoring {} progress while {} is active",
                operation,
                task.operation
            );
            return;
        }

        task.update(current, total, message);

        if code.is_end() {
            tracing::debug!("Phase finished: {}", operation);
            task.finish(message);
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        for task in self.tasks.iter().filter(|task| !task.finished) {
            task.bar.abandon();
        }
    }
}
