use log::{debug, info, warn};

use tasketa::{Clock, DisplayProgress, RefreshController, ReportFormatter, RunState, TickOutcome};

use crate::config::AppConfig;

pub const DEFAULT_TITLE: &str = "tasketa";

pub struct App {
    pub input: String,
    pub result: String,
    pub title: String,
    pub progress: DisplayProgress,
    pub logs: Vec<String>,
    config: AppConfig,
    controller: RefreshController,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(config: AppConfig, clock: Box<dyn Clock>) -> Self {
        info!("Creating new App instance");
        debug!(
            "App config: refresh={:?}, utc={}",
            config.refresh_interval, config.utc
        );
        let formatter = ReportFormatter::new(config.end_time_format.clone(), config.utc);
        let controller = RefreshController::new(config.refresh_interval, formatter);
        Self {
            input: String::new(),
            result: String::new(),
            title: DEFAULT_TITLE.to_string(),
            progress: DisplayProgress::Waiting,
            logs: Vec::new(),
            config,
            controller,
            clock,
        }
    }

    pub fn calculate(&mut self) {
        if self.input.trim().is_empty() {
            warn!("Attempted to calculate with empty input");
            self.log("Paste a task status response first.");
            return;
        }
        let outcome = self.controller.start(&self.input, self.clock.as_ref());
        match &outcome {
            TickOutcome::Failed(_) => self.log("Calculation failed."),
            _ => {
                if let Some(input) = self.controller.input() {
                    let line = format!(
                        "Tracking {} ({} / {})",
                        input.label(),
                        input.processed,
                        input.total
                    );
                    self.log(line);
                }
            }
        }
        self.apply(outcome);
    }

    /// Runs a due tick, if any. Returns true when the display changed.
    pub fn on_tick(&mut self) -> bool {
        match self.controller.poll(self.clock.as_ref()) {
            Some(outcome) => {
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    pub fn next_tick_in(&self) -> Option<std::time::Duration> {
        self.controller.time_until_next_tick(self.clock.as_ref())
    }

    pub fn stop(&mut self) {
        if self.controller.is_ticking() {
            self.controller.stop();
            self.log("Refresh stopped.");
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn state(&self) -> RunState {
        self.controller.state()
    }

    pub fn is_ticking(&self) -> bool {
        self.controller.is_ticking()
    }

    fn apply(&mut self, outcome: TickOutcome) {
        self.result = outcome.text();
        match &outcome {
            TickOutcome::Progress(report) => {
                self.progress = report.display_progress;
                self.title = report.title.clone();
            }
            TickOutcome::Completed(report) => {
                self.progress = report.display_progress;
                self.title = report.title.clone();
                self.log("Task is estimated to be complete.");
            }
            TickOutcome::Failed(_) => {
                self.progress = DisplayProgress::Waiting;
                self.title = DEFAULT_TITLE.to_string();
            }
        }
    }

    fn log(&mut self, entry: impl Into<String>) {
        let line = entry.into();
        info!("{}", line);
        self.logs.push(line);
        if self.logs.len() > self.config.history_limit {
            let excess = self.logs.len() - self.config.history_limit;
            self.logs.drain(0..excess);
        }
    }
}
