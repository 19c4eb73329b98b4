//! Headless host for the HIVE-MAP display engine.
//!
//! Loads configuration, initialises logging, and drives one engine
//! instance in real time. Each published change is rendered to the log by
//! the console renderer. Operator buttons are typed on stdin:
//!
//! - `stop` -- emergency stop
//! - `calibrate` -- calibrate
//! - `quit` -- end the run
//!
//! The run also ends on Ctrl-C or when `run.max_real_time_seconds` elapses.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hivemap-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine and mission control
//! 4. Spawn the Ctrl-C and stdin listeners
//! 5. Run the display loop
//! 6. Log and print the result

mod console;
mod error;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use hivemap_core::clock::MonotonicClock;
use hivemap_core::config::HivemapConfig;
use hivemap_core::control::{HostAction, MissionControl};
use hivemap_core::engine::Engine;
use hivemap_core::runner::{self, RunSummary};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleRenderer, LoggingHooks};
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "hivemap-config.yaml";

/// Application entry point for the display host.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the display loop fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        seed = config.engine.seed,
        blip_period_ms = config.timing.blip_period_ms,
        acoustic_period_ms = config.timing.acoustic_period_ms,
        telemetry_period_ms = config.timing.telemetry_period_ms,
        frame_interval_ms = config.timing.frame_interval_ms,
        "hivemap-engine starting"
    );

    // 3. Build the engine.
    let control = Arc::new(MissionControl::from_config(&config));
    let mut engine = Engine::seeded(config, MonotonicClock::new())?.with_hooks(LoggingHooks);
    let mut renderer = ConsoleRenderer::new(*engine.geometry());

    // 4. Operator input.
    spawn_ctrl_c_listener(Arc::clone(&control));
    spawn_stdin_listener(Arc::clone(&control));

    // 5. Run.
    let summary = runner::run_engine(&mut engine, &control, &mut renderer).await?;

    // 6. Report.
    runner::log_run_end(&summary);
    print_report(&summary)?;
    Ok(())
}

/// Load configuration from the first argument or the default path.
///
/// A missing default file falls back to built-in defaults; a missing
/// explicitly named file is an error.
fn load_config() -> Result<HivemapConfig, EngineError> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return Ok(HivemapConfig::from_file(&path)?);
    }
    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        Ok(HivemapConfig::from_file(&path)?)
    } else {
        let mut config = HivemapConfig::default();
        config.engine.apply_env_overrides();
        Ok(config)
    }
}

fn spawn_ctrl_c_listener(control: Arc<MissionControl>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received");
                control.request_stop();
            }
            Err(err) => warn!(%err, "Ctrl-C handler unavailable"),
        }
    });
}

fn spawn_stdin_listener(control: Arc<MissionControl>) {
    tokio::spawn(async move {
        if let Err(err) = read_operator_input(&control).await {
            warn!(%err, "stdin listener stopped");
        }
    });
}

/// Relay operator commands from stdin until EOF or `quit`.
async fn read_operator_input(control: &MissionControl) -> Result<(), EngineError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        if word.eq_ignore_ascii_case("quit") || word.eq_ignore_ascii_case("q") {
            control.request_stop();
            break;
        }
        match HostAction::parse(word) {
            Some(action) => control.push_action(action).await,
            None => warn!(command = word, "unknown command (stop, calibrate, quit)"),
        }
    }
    Ok(())
}

/// Print the run totals to stdout.
fn print_report(summary: &RunSummary) -> Result<(), EngineError> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "reason: {:?}", summary.end_reason)?;
    writeln!(out, "frames: {}", summary.frames_rendered)?;
    for (kind, count) in &summary.fires {
        writeln!(out, "{kind} refreshes: {count}")?;
    }
    writeln!(out, "voice alerts: {}", summary.alert_activations)?;
    out.flush()?;
    Ok(())
}
