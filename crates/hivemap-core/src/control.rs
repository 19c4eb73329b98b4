//! Shared host control state for a running display.
//!
//! [`MissionControl`] is wrapped in an [`Arc`](std::sync::Arc) and shared
//! between the frame loop and whatever tasks the host runs for input (a
//! signal handler, a stdin reader). The loop reads the stop flag and the
//! action queue once per frame; the host side only ever writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::config::{HivemapConfig, RunConfig};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The host asked the loop to stop.
    StopRequested,
    /// The configured wall-clock limit elapsed.
    TimeLimitReached,
}

/// An operator button press relayed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostAction {
    /// The emergency stop button.
    EmergencyStop,
    /// The calibrate button.
    Calibrate,
}

impl HostAction {
    /// Parse a host command word, case-insensitively.
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "stop" | "emergency" | "emergency-stop" => Some(Self::EmergencyStop),
            "calibrate" | "cal" => Some(Self::Calibrate),
            _ => None,
        }
    }
}

/// Control plane shared by the frame loop and host input tasks.
#[derive(Debug)]
pub struct MissionControl {
    /// Set once a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the frame loop when a stop is requested.
    stop_notify: Notify,

    /// Wall-clock time the run started.
    started_at: DateTime<Utc>,

    /// When the run must end, if bounded.
    deadline: Option<Instant>,

    /// Configured limit (0 = unlimited).
    max_real_time_seconds: u64,

    /// Milliseconds between rendered frames.
    frame_interval_ms: u64,

    /// Actions awaiting the next frame.
    actions: Mutex<Vec<HostAction>>,
}

impl MissionControl {
    /// Create control state for a run starting now.
    pub fn new(frame_interval_ms: u64, run: &RunConfig) -> Self {
        let deadline = if run.max_real_time_seconds > 0 {
            Instant::now().checked_add(Duration::from_secs(run.max_real_time_seconds))
        } else {
            None
        };
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            started_at: Utc::now(),
            deadline,
            max_real_time_seconds: run.max_real_time_seconds,
            frame_interval_ms,
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Create control state from the full configuration.
    pub fn from_config(config: &HivemapConfig) -> Self {
        Self::new(config.timing.frame_interval_ms, &config.run)
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the frame loop to stop after the current frame.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether the wall-clock limit has elapsed. Always `false` if unlimited.
    pub fn time_limit_reached(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Configured wall-clock limit in seconds (0 = unlimited).
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Milliseconds between rendered frames.
    pub const fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Queue an action for the next frame.
    pub async fn push_action(&self, action: HostAction) {
        self.actions.lock().await.push(action);
    }

    /// Take every queued action, oldest first.
    pub async fn drain_actions(&self) -> Vec<HostAction> {
        let mut queue = self.actions.lock().await;
        std::mem::take(&mut *queue)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn control(max_real_time_seconds: u64) -> MissionControl {
        MissionControl::new(
            16,
            &RunConfig {
                max_real_time_seconds,
            },
        )
    }

    #[test]
    fn parse_host_commands() {
        assert_eq!(HostAction::parse("stop"), Some(HostAction::EmergencyStop));
        assert_eq!(HostAction::parse(" Calibrate\n"), Some(HostAction::Calibrate));
        assert_eq!(HostAction::parse("launch"), None);
    }

    #[tokio::test]
    async fn actions_drain_in_order() {
        let c = control(0);
        c.push_action(HostAction::Calibrate).await;
        c.push_action(HostAction::EmergencyStop).await;
        assert_eq!(
            c.drain_actions().await,
            vec![HostAction::Calibrate, HostAction::EmergencyStop]
        );
        assert!(c.drain_actions().await.is_empty());
    }

    #[tokio::test]
    async fn stop_wakes_waiter() {
        let c = Arc::new(control(0));
        assert!(!c.is_stop_requested());
        let waiter = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.stopped().await })
        };
        c.request_stop();
        assert!(waiter.await.is_ok());
        assert!(c.is_stop_requested());
    }

    #[tokio::test]
    async fn stopped_returns_when_already_requested() {
        let c = control(0);
        c.request_stop();
        c.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_follows_deadline() {
        let c = control(2);
        assert!(!c.time_limit_reached());
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(!c.time_limit_reached());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(c.time_limit_reached());
    }

    #[test]
    fn unlimited_never_expires() {
        let c = control(0);
        assert!(!c.time_limit_reached());
        assert_eq!(c.max_real_time_seconds(), 0);
        assert_eq!(c.frame_interval_ms(), 16);
    }
}
