use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub struct FileLogger {
    file: Arc<Mutex<File>>,
    level: LevelFilter,
    echo_to_stderr: bool,
}

impl FileLogger {
    pub fn new(log_path: PathBuf, echo_to_stderr: bool) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            level: LevelFilter::Trace,
            echo_to_stderr,
        })
    }

    /// `echo_to_stderr` must stay off while the TUI owns the terminal.
    pub fn init(log_path: PathBuf, echo_to_stderr: bool) -> Result<(), Box<dyn std::error::Error>> {
        let logger = Self::new(log_path, echo_to_stderr)?;
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }

    fn format_record(record: &Record) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        format!(
            "[{}] {} [{}:{}] {}\n",
            timestamp,
            level_str,
            record.module_path().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
            record.args()
        )
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = Self::format_record(record);
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(message.as_bytes());
            let _ = file.flush();
        }
        if self.echo_to_stderr && record.level() <= Level::Warn {
            eprintln!("{}", record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_formatted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasketa.log");
        let logger = FileLogger::new(path.clone(), false).unwrap();
        logger.log(
            &Record::builder()
                .args(format_args!("tick at {}", 42))
                .level(Level::Info)
                .module_path(Some("tasketa::controller"))
                .line(Some(7))
                .build(),
        );
        logger.flush();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("INFO  [tasketa::controller:7] tick at 42"));
    }
}
