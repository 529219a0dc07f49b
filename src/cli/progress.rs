//! Progress reporting for long-running commands.
//!
//! Adapts to the output context:
//! - TTY: an animated bar on stderr
//! - non-TTY: one line per finished skill on stderr
//! - machine mode: JSON progress events on stderr
//! - quiet: nothing

use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::vendor::SyncProgress;

/// Progress output mode based on terminal capabilities and user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    ProgressStart,
    ProgressUpdate,
    ProgressComplete,
}

/// JSON progress event for machine mode
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: ProgressEventType,
    pub operation: String,
    pub current: u64,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    pub timestamp: String,
}

impl ProgressEvent {
    fn new(event: ProgressEventType, operation: &str, current: u64, total: u64) -> Self {
        Self {
            event_type: "progress",
            event,
            operation: operation.to_string(),
            current,
            total,
            skill: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

/// Per-skill progress for `skill install`.
pub struct SyncProgressBar {
    mode: ProgressMode,
    operation: String,
    bar: Option<ProgressBar>,
    done: AtomicU64,
    total: AtomicU64,
}

impl SyncProgressBar {
    #[must_use]
    pub fn new(mode: ProgressMode, operation: &str) -> Self {
        Self {
            mode,
            operation: operation.to_string(),
            bar: (mode == ProgressMode::Tty).then(|| new_bar(operation)),
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Clear the bar once the run is over.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        if self.mode == ProgressMode::Robot {
            ProgressEvent::new(
                ProgressEventType::ProgressComplete,
                &self.operation,
                self.done.load(Ordering::SeqCst),
                self.total.load(Ordering::SeqCst),
            )
            .emit();
        }
    }
}

fn new_bar(operation: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░");
    bar.set_style(style);
    bar.set_message(operation.to_string());
    bar
}

impl SyncProgress for SyncProgressBar {
    fn started(&self, total: usize) {
        let total = total as u64;
        self.total.store(total, Ordering::SeqCst);
        match self.mode {
            ProgressMode::Tty => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total);
                }
            }
            ProgressMode::Robot => {
                ProgressEvent::new(ProgressEventType::ProgressStart, &self.operation, 0, total).emit();
            }
            ProgressMode::NonTty => eprintln!("[skill] {} ({total} skills)", self.operation),
            ProgressMode::Quiet => {}
        }
    }

    fn finished(&self, name: &str) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        match self.mode {
            ProgressMode::Tty => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }
            ProgressMode::Robot => {
                let mut event =
                    ProgressEvent::new(ProgressEventType::ProgressUpdate, &self.operation, done, total);
                event.skill = Some(name.to_string());
                event.emit();
            }
            ProgressMode::NonTty => eprintln!("[skill] {name} ({done}/{total})"),
            ProgressMode::Quiet => {}
        }
    }
}
