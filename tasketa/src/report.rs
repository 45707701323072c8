use std::fmt::{Display, Write};

use chrono::{DateTime, Local, Utc};

use crate::document::ProgressInput;
use crate::estimate::ProgressEstimate;

pub const DEFAULT_END_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const COMPLETION_NOTICE: &str = "Task is estimated to be complete.";

/// What the progress icon should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayProgress {
    /// No run has produced an estimate yet.
    Waiting,
    /// Truncated percentage, below 100.
    Percent(f64),
    Finished,
}

impl DisplayProgress {
    /// Clamped to `0..=100` for the icon; the report text keeps the raw value.
    pub fn from_percentage(percentage: f64) -> Self {
        let truncated = truncate_percentage(percentage.clamp(0.0, 100.0));
        if truncated >= 100.0 {
            DisplayProgress::Finished
        } else {
            DisplayProgress::Percent(truncated)
        }
    }

    /// 0..=100, or -1 while waiting.
    pub fn value(&self) -> f64 {
        match self {
            DisplayProgress::Waiting => -1.0,
            DisplayProgress::Percent(value) => *value,
            DisplayProgress::Finished => 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub remaining: String,
    pub end_time: String,
    pub actual: String,
    pub estimated: String,
    pub title: String,
    pub display_progress: DisplayProgress,
}

impl Report {
    pub fn lines(&self) -> [&str; 4] {
        [
            self.remaining.as_str(),
            self.end_time.as_str(),
            self.actual.as_str(),
            self.estimated.as_str(),
        ]
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct ReportFormatter {
    end_time_format: String,
    utc: bool,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_END_TIME_FORMAT, false)
    }
}

impl ReportFormatter {
    pub fn new(end_time_format: impl Into<String>, utc: bool) -> Self {
        Self {
            end_time_format: end_time_format.into(),
            utc,
        }
    }

    pub fn render(&self, input: &ProgressInput, estimate: &ProgressEstimate) -> Report {
        let total = input.total as f64;
        let end_time_millis =
            estimate.current_time as f64 + estimate.estimated_remaining_time_millis;

        let percentage = (estimate.estimated_processed / total * 100.0).min(100.0);
        let display_percentage = format_truncated_percentage(percentage);
        let actual_percentage = input.processed as f64 / total * 100.0;
        let estimated_count = estimate.estimated_processed.min(total).floor();

        Report {
            remaining: format_remaining_time(estimate.estimated_remaining_time_millis),
            end_time: format!("Estimated end time: {}", self.format_end_time(end_time_millis)),
            actual: format!(
                "Actual progress: {} / {} ({:.2}%)",
                input.processed, input.total, actual_percentage
            ),
            estimated: format!(
                "Estimated progress: {} / {} ({:.2}%)",
                estimated_count, input.total, percentage
            ),
            title: format!("{}% {}", display_percentage, input.label()),
            display_progress: DisplayProgress::from_percentage(percentage),
        }
    }

    fn format_end_time(&self, end_time_millis: f64) -> String {
        let Some(end) = DateTime::<Utc>::from_timestamp_millis(end_time_millis as i64) else {
            return "out of range".to_string();
        };
        let formatted = if self.utc {
            write_formatted(end.format(&self.end_time_format))
        } else {
            write_formatted(end.with_timezone(&Local).format(&self.end_time_format))
        };
        // A bad strftime pattern from the config falls back to RFC 3339.
        formatted.unwrap_or_else(|| end.to_rfc3339())
    }
}

fn write_formatted(item: impl Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{item}").ok()?;
    Some(out)
}

pub fn format_remaining_time(remaining_millis: f64) -> String {
    let prefix = "Estimated remaining time: ";
    if remaining_millis <= 0.0 {
        return format!("{prefix}0s");
    }

    let remaining_seconds = (remaining_millis / 1000.0).floor() as u64;
    let days = remaining_seconds / 86_400;
    let hours = remaining_seconds % 86_400 / 3_600;
    let minutes = remaining_seconds % 3_600 / 60;
    let seconds = remaining_seconds % 60;

    let mut out = String::from(prefix);
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 || days > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

/// One decimal below 10%, whole numbers above; always truncated, never rounded.
pub fn truncate_percentage(percentage: f64) -> f64 {
    if percentage < 10.0 {
        (percentage * 10.0).floor() / 10.0
    } else {
        percentage.floor()
    }
}

pub fn format_truncated_percentage(percentage: f64) -> String {
    let truncated = truncate_percentage(percentage);
    if percentage < 10.0 {
        format!("{truncated:.1}")
    } else {
        format!("{truncated:.0}")
    }
}
