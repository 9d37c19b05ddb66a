//! Clone progress aggregation
//!
//! Repository clients report progress through a [`ProgressSink`]. The
//! [`ProgressAggregator`] keeps only the final state of each task so the
//! finished clone can be reported as one short summary instead of a stream
//! of percentage updates.

use std::fmt;
use std::time::Duration;

/// A progress report for one task of a clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Task name, e.g. "Receiving objects"
    pub task: String,
    /// Units completed so far
    pub current: u64,
    /// Total units, 0 if unknown
    pub total: u64,
    /// Time since the task started
    pub elapsed: Duration,
}

impl ProgressEvent {
    pub fn new(task: impl Into<String>, current: u64, total: u64, elapsed: Duration) -> Self {
        Self {
            task: task.into(),
            current,
            total,
            elapsed,
        }
    }
}

/// Receiver for clone progress
pub trait ProgressSink {
    /// A task's unit count changed
    fn update(&mut self, event: ProgressEvent);

    /// Raw progress text sent by the remote server
    fn remote_message(&mut self, _text: &str) {}
}

/// Accumulates progress and renders the final state of every task
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    /// Latest event per task, in first-seen order
    tasks: Vec<ProgressEvent>,
    /// Completed remote message lines
    remote_lines: Vec<String>,
    /// Remote text not yet terminated by a newline
    remote_pending: String,
    /// Last remote character was `\r`; the pending line is redrawn unless `\n` follows
    remote_cr: bool,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the consolidated summary
    ///
    /// Empty when nothing was reported.
    pub fn summary(&self) -> CloneSummary {
        let mut lines: Vec<String> = self.remote_lines.clone();

        if !self.remote_pending.trim().is_empty() {
            lines.push(self.remote_pending.clone());
        }

        lines.extend(self.tasks.iter().map(render_task));

        CloneSummary::new(lines.join("\n"))
    }
}

impl ProgressSink for ProgressAggregator {
    fn update(&mut self, event: ProgressEvent) {
        match self.tasks.iter_mut().find(|t| t.task == event.task) {
            Some(existing) => *existing = event,
            None => self.tasks.push(event),
        }
    }

    fn remote_message(&mut self, text: &str) {
        // A `\r\n` pair may be split across two sideband packets
        for c in text.chars() {
            match c {
                '\n' => {
                    self.remote_cr = false;
                    let line = std::mem::take(&mut self.remote_pending);
                    if !line.trim().is_empty() {
                        self.remote_lines.push(line);
                    }
                }
                '\r' => self.remote_cr = true,
                c => {
                    // Bare carriage return: the line was redrawn in place
                    if std::mem::take(&mut self.remote_cr) {
                        self.remote_pending.clear();
                    }
                    self.remote_pending.push(c);
                }
            }
        }
    }
}

fn render_task(event: &ProgressEvent) -> String {
    let elapsed = format_elapsed(event.elapsed);

    if event.total == 0 {
        return format!("{}: {} [{}]", event.task, event.current, elapsed);
    }

    let pct = event.current.saturating_mul(100) / event.total;
    format!(
        "{}: {}% ({}/{}) [{}]",
        event.task, pct, event.current, event.total, elapsed
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
}

/// Consolidated, flush-left description of a finished clone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneSummary {
    text: String,
}

impl CloneSummary {
    /// Build a summary, stripping leading whitespace from every line
    ///
    /// Blank lines are dropped.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text
            .as_ref()
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for CloneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
