mod app;
mod config;
mod logger;
mod tui;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use tasketa::{RefreshController, ReportFormatter, SystemClock, TickOutcome};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read the task status response from this file (stdin with --once if omitted)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Print a single estimate and exit instead of opening the UI
    #[arg(long)]
    once: bool,

    /// Refresh cadence in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Show end times in UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => config::AppConfig::load_from(path)?,
        None => config::AppConfig::load()?,
    };
    if let Some(millis) = cli.interval_ms {
        config.refresh_interval = config::validate_interval(millis)?;
    }
    if cli.utc {
        config.utc = true;
    }

    if let Err(err) = logger::FileLogger::init(config.log_file.clone(), cli.once) {
        eprintln!("logging disabled ({}): {err}", config.log_file.display());
    }
    info!("tasketa starting (once={})", cli.once);

    if cli.once {
        let raw = read_input(cli.input.as_ref())?;
        return Ok(run_once(&raw, &config));
    }

    let mut app = app::App::new(config, Box::new(SystemClock));
    if let Some(path) = &cli.input {
        app.input = fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
    }
    tui::run(&mut app)?;
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display())),
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed reading stdin")?;
            Ok(raw)
        }
    }
}

fn run_once(raw: &str, config: &config::AppConfig) -> ExitCode {
    let formatter = ReportFormatter::new(config.end_time_format.clone(), config.utc);
    let mut controller = RefreshController::new(config.refresh_interval, formatter);
    let outcome = controller.start(raw, &SystemClock);
    controller.stop();
    match &outcome {
        TickOutcome::Failed(message) => {
            warn!("One-shot estimate failed");
            println!("{message}");
            ExitCode::FAILURE
        }
        TickOutcome::Progress(report) | TickOutcome::Completed(report) => {
            println!("{}", outcome.text());
            println!("{}", report.title);
            ExitCode::SUCCESS
        }
    }
}
