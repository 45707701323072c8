//! Drives the normalize → decode → extract → estimate → render pipeline and
//! re-ticks the extracted input on a fixed cadence until the forecast says the
//! task is done.

use std::time::Duration;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::decode::decode;
use crate::document::ProgressInput;
use crate::error::Result;
use crate::estimate::estimate;
use crate::extract::extract;
use crate::normalize::normalize;
use crate::report::{COMPLETION_NOTICE, Report, ReportFormatter};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Progress(Report),
    /// Final report; no further ticks are scheduled.
    Completed(Report),
    /// The run was aborted with this user-facing message.
    Failed(String),
}

impl TickOutcome {
    pub fn text(&self) -> String {
        match self {
            TickOutcome::Progress(report) => report.text(),
            TickOutcome::Completed(report) => format!("{}\n{COMPLETION_NOTICE}", report.text()),
            TickOutcome::Failed(message) => message.clone(),
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            TickOutcome::Progress(report) | TickOutcome::Completed(report) => Some(report),
            TickOutcome::Failed(_) => None,
        }
    }
}

/// Pending tick, owned by exactly one controller.
#[derive(Debug)]
struct TickHandle {
    due_at: i64,
}

/// Runs the pipeline once per pasted document, then ticks.
pub struct RefreshController {
    interval_millis: i64,
    formatter: ReportFormatter,
    state: RunState,
    input: Option<ProgressInput>,
    handle: Option<TickHandle>,
}

/// Normalize, decode and extract in one go.
pub fn prepare(raw: &str) -> Result<ProgressInput> {
    let strict = normalize(raw);
    let doc = decode(&strict)?;
    extract(doc)
}

impl RefreshController {
    pub fn new(interval: Duration, formatter: ReportFormatter) -> Self {
        Self {
            interval_millis: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1),
            formatter,
            state: RunState::Idle,
            input: None,
            handle: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn input(&self) -> Option<&ProgressInput> {
        self.input.as_ref()
    }

    pub fn is_ticking(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts a fresh run, cancelling whatever was scheduled before.
    pub fn start(&mut self, raw: &str, clock: &dyn Clock) -> TickOutcome {
        self.stop();
        self.input = None;
        info!("Starting refresh run ({} bytes of input)", raw.len());

        let input = match prepare(raw) {
            Ok(input) => input,
            Err(err) => {
                warn!("Run aborted before first tick: {}", err);
                self.state = RunState::Failed;
                return TickOutcome::Failed(err.to_string());
            }
        };
        self.input = Some(input);
        self.state = RunState::Running;

        let now = clock.now_millis();
        let outcome = self.tick(now);
        if self.state == RunState::Running {
            self.schedule(now.saturating_add(self.interval_millis));
        }
        outcome
    }

    /// Runs a tick if one is due. `None` when nothing is scheduled or it is too early.
    pub fn poll(&mut self, clock: &dyn Clock) -> Option<TickOutcome> {
        let due_at = self.handle.as_ref()?.due_at;
        let now = clock.now_millis();
        if now < due_at {
            return None;
        }
        self.handle = None;

        let outcome = self.tick(now);
        if self.state == RunState::Running {
            let mut next = due_at.saturating_add(self.interval_millis);
            if next <= now {
                // Host was stalled; resume the cadence from now instead of bursting.
                next = now.saturating_add(self.interval_millis);
            }
            self.schedule(next);
        }
        Some(outcome)
    }

    pub fn time_until_next_tick(&self, clock: &dyn Clock) -> Option<Duration> {
        let due_at = self.handle.as_ref()?.due_at;
        let wait = due_at.saturating_sub(clock.now_millis()).max(0);
        Some(Duration::from_millis(wait as u64))
    }

    /// Clears the pending tick. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.handle.take().is_some() {
            debug!("Cleared pending tick");
        }
    }

    fn schedule(&mut self, due_at: i64) {
        debug_assert!(self.handle.is_none(), "previous tick handle not cleared");
        self.handle = Some(TickHandle { due_at });
    }

    fn tick(&mut self, now: i64) -> TickOutcome {
        let Some(input) = self.input.as_ref() else {
            return TickOutcome::Failed("No task data loaded.".into());
        };

        match estimate(input, now) {
            Ok(estimate) => {
                let report = self.formatter.render(input, &estimate);
                if estimate.is_complete(input.total) {
                    info!("Task {} estimated complete at {}", input.task_id, now);
                    self.state = RunState::Completed;
                    self.stop();
                    TickOutcome::Completed(report)
                } else {
                    debug!("Tick at {}: {}", now, report.title);
                    TickOutcome::Progress(report)
                }
            }
            Err(err) => {
                warn!("Estimate failed: {}", err);
                self.state = RunState::Failed;
                self.stop();
                TickOutcome::Failed(err.to_string())
            }
        }
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.stop();
    }
}
