//! Real-time frame loop around an [`Engine`].
//!
//! [`run_engine`] is the host's main loop. Once per frame interval it:
//!
//! 1. checks for a stop request or an elapsed time limit,
//! 2. forwards queued host actions to the engine,
//! 3. pumps the engine so due timers fire,
//! 4. hands the resulting [`Frame`] to a [`FrameConsumer`].
//!
//! The frame timer uses fixed-delay semantics: a slow consumer delays the
//! next frame instead of causing a burst of frames to catch up. The engine
//! is always stopped before the loop returns.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::control::{EndReason, HostAction, MissionControl};
use crate::engine::{Engine, Frame, PumpSummary};
use crate::scheduler::{LifecycleError, TimerKind};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The engine could not be started.
    #[error("lifecycle error: {source}")]
    Lifecycle {
        /// The underlying lifecycle error.
        #[from]
        source: LifecycleError,
    },
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop ended.
    pub end_reason: EndReason,
    /// Frames handed to the consumer.
    pub frames_rendered: u64,
    /// Timer fires per kind over the whole engine lifetime.
    pub fires: BTreeMap<TimerKind, u64>,
    /// Alert flash runs started.
    pub alert_activations: u64,
}

/// Receiver of every rendered frame.
pub trait FrameConsumer: Send {
    /// Called once per frame, after the engine has been pumped.
    fn on_frame(&mut self, frame: &Frame, pump: &PumpSummary);
}

/// A consumer that discards frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpConsumer;

impl FrameConsumer for NoOpConsumer {
    fn on_frame(&mut self, _frame: &Frame, _pump: &PumpSummary) {}
}

/// Drive `engine` in real time until stopped or out of time.
///
/// # Errors
///
/// Returns [`RunnerError::Lifecycle`] if the engine was already running.
pub async fn run_engine<C: Clock, R: Rng>(
    engine: &mut Engine<C, R>,
    control: &Arc<MissionControl>,
    consumer: &mut dyn FrameConsumer,
) -> Result<RunSummary, RunnerError> {
    engine.start()?;

    info!(
        frame_interval_ms = control.frame_interval_ms(),
        max_real_time_seconds = control.max_real_time_seconds(),
        started_at = %control.started_at(),
        "Display loop starting"
    );

    let mut frames = tokio::time::interval(Duration::from_millis(
        control.frame_interval_ms().max(1),
    ));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frames_rendered: u64 = 0;

    let end_reason = loop {
        tokio::select! {
            _ = frames.tick() => {}
            () = control.stopped() => {}
        }

        if control.is_stop_requested() {
            info!("Stop requested");
            break EndReason::StopRequested;
        }
        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            break EndReason::TimeLimitReached;
        }

        for action in control.drain_actions().await {
            match action {
                HostAction::EmergencyStop => engine.emergency_stop(),
                HostAction::Calibrate => engine.calibrate(),
            }
        }

        let pump = engine.pump();
        consumer.on_frame(&engine.frame(), &pump);
        frames_rendered = frames_rendered.saturating_add(1);
    };

    engine.stop();

    let fires = TimerKind::ALL
        .into_iter()
        .map(|kind| (kind, engine.scheduler().fire_count(kind)))
        .collect();

    Ok(RunSummary {
        end_reason,
        frames_rendered,
        fires,
        alert_activations: engine.alert_activations(),
    })
}

/// Log the outcome of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        frames = summary.frames_rendered,
        alerts = summary.alert_activations,
        "Display loop ended"
    );
    for (kind, count) in &summary.fires {
        info!(timer = %kind, fires = count, "Refresh totals");
    }
    if summary.frames_rendered == 0 {
        warn!("Display loop ended before rendering a frame");
    }
}
