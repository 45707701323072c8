use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace};
use serde::Deserialize;

use tasketa::report::DEFAULT_END_TIME_FORMAT;

const DEFAULT_REFRESH_MS: u64 = 1000;
const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub refresh_interval: Duration,
    pub end_time_format: String,
    pub utc: bool,
    pub history_limit: usize,
    pub log_file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    refresh_interval_ms: Option<u64>,
    end_time_format: Option<String>,
    utc: Option<bool>,
    history_limit: Option<usize>,
    log_file: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let file_cfg = match config_file_path() {
            Some(path) => read_file_config(&path)?,
            None => {
                debug!("No config directory found, using defaults");
                FileConfig::default()
            }
        };
        Self::resolve(file_cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::resolve(read_file_config(path)?)
    }

    fn resolve(file_cfg: FileConfig) -> Result<Self> {
        info!("Loading application configuration");

        let refresh_ms = match env_value("TASKETA_REFRESH_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("TASKETA_REFRESH_MS is not a number: {raw}"))?,
            None => file_cfg.refresh_interval_ms.unwrap_or(DEFAULT_REFRESH_MS),
        };
        let refresh_interval = validate_interval(refresh_ms)?;
        debug!("Refresh interval: {:?}", refresh_interval);

        let end_time_format = file_cfg
            .end_time_format
            .unwrap_or_else(|| DEFAULT_END_TIME_FORMAT.to_string());
        debug!("End time format: {}", end_time_format);

        let utc = resolve_bool("TASKETA_UTC")
            .or(file_cfg.utc)
            .unwrap_or(false);

        let history_limit = file_cfg.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        debug!("History limit: {}", history_limit);

        trace!("Resolving log file");
        let log_file = resolve_log_file(file_cfg.log_file.as_deref());
        info!("Log file: {}", log_file.display());

        Ok(Self {
            refresh_interval,
            end_time_format,
            utc,
            history_limit,
            log_file,
        })
    }
}

pub fn validate_interval(millis: u64) -> Result<Duration> {
    if millis == 0 {
        return Err(anyhow!("refresh interval must be at least 1 ms"));
    }
    Ok(Duration::from_millis(millis))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        debug!(
            "Config file does not exist: {}, using defaults",
            path.display()
        );
        return Ok(FileConfig::default());
    }

    info!("Reading config file: {}", path.display());
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading config file {}", path.display()))?;

    trace!("Parsing TOML config");
    toml::from_str(&data).with_context(|| {
        format!(
            "invalid TOML in {} (make sure string values are quoted)",
            path.display()
        )
    })
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tasketa").join("config.toml"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_bool(name: &str) -> Option<bool> {
    parse_bool(&env_value(name)?)
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_log_file(file_override: Option<&str>) -> PathBuf {
    if let Some(env_path) = env_value("TASKETA_LOG_FILE") {
        return PathBuf::from(env_path);
    }
    if let Some(path) = file_override {
        return PathBuf::from(path);
    }
    let base = dirs::data_dir().or_else(|| dirs::home_dir().map(|h| h.join(".local/share")));
    base.unwrap_or_else(|| PathBuf::from("."))
        .join("tasketa")
        .join("tasketa.log")
}
