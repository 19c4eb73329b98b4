//! Fixed-delay timers for the three data refreshes.
//!
//! The scheduler holds no clock of its own. [`TickScheduler::poll`] is handed
//! the current time and reports one due timer per call, so the engine can
//! drain every fire for a given instant in a deterministic order.
//!
//! Timers re-arm at `now + period` when they fire, never at
//! `previous_due + period`. A long stall therefore produces a single late
//! fire rather than a burst of catch-up fires.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::config::TimingConfig;

/// Errors from lifecycle misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// `start` was called while the timers were already armed.
    #[error("engine is already running")]
    AlreadyRunning,
}

/// The three periodic refreshes, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Proximity field refresh.
    Blips,
    /// Waveform refresh and voice detection.
    Acoustic,
    /// Telemetry random-walk step.
    Telemetry,
}

impl TimerKind {
    /// Every timer kind, in tie-break order.
    pub const ALL: [Self; 3] = [Self::Blips, Self::Acoustic, Self::Telemetry];
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blips => "blips",
            Self::Acoustic => "acoustic",
            Self::Telemetry => "telemetry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    period_ms: u64,
    next_due_ms: Option<u64>,
    fires: u64,
}

/// Owner of the three refresh timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickScheduler {
    timers: BTreeMap<TimerKind, Timer>,
}

impl TickScheduler {
    /// Build a stopped scheduler from validated timing configuration.
    pub fn from_config(config: &TimingConfig) -> Self {
        let timers = [
            (TimerKind::Blips, config.blip_period_ms),
            (TimerKind::Acoustic, config.acoustic_period_ms),
            (TimerKind::Telemetry, config.telemetry_period_ms),
        ]
        .into_iter()
        .map(|(kind, period_ms)| {
            (
                kind,
                Timer {
                    period_ms,
                    next_due_ms: None,
                    fires: 0,
                },
            )
        })
        .collect();
        Self { timers }
    }

    /// Whether any timer is armed.
    pub fn is_running(&self) -> bool {
        self.timers.values().any(|t| t.next_due_ms.is_some())
    }

    /// Number of armed timers: 3 while running, 0 while stopped.
    pub fn active_timers(&self) -> usize {
        self.timers
            .values()
            .filter(|t| t.next_due_ms.is_some())
            .count()
    }

    /// When `kind` next fires, if armed.
    pub fn next_due(&self, kind: TimerKind) -> Option<u64> {
        self.timers.get(&kind).and_then(|t| t.next_due_ms)
    }

    /// Configured period of `kind`.
    pub fn period(&self, kind: TimerKind) -> Option<u64> {
        self.timers.get(&kind).map(|t| t.period_ms)
    }

    /// How many times `kind` has fired since construction.
    pub fn fire_count(&self, kind: TimerKind) -> u64 {
        self.timers.get(&kind).map_or(0, |t| t.fires)
    }

    /// Arm every timer to first fire one period after `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] if the timers are already
    /// armed; nothing is changed in that case.
    pub fn start(&mut self, now_ms: u64) -> Result<(), LifecycleError> {
        if self.is_running() {
            warn!(now_ms, "start requested while timers are armed");
            return Err(LifecycleError::AlreadyRunning);
        }
        for timer in self.timers.values_mut() {
            timer.next_due_ms = Some(now_ms.saturating_add(timer.period_ms));
        }
        debug!(now_ms, "timers armed");
        Ok(())
    }

    /// Disarm every timer. Returns `false` if nothing was armed.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        for timer in self.timers.values_mut() {
            timer.next_due_ms = None;
        }
        if was_running {
            debug!("timers disarmed");
        }
        was_running
    }

    /// Fire the earliest due timer at `now_ms`, if any.
    ///
    /// Ties on the due time resolve in [`TimerKind::ALL`] order. The fired
    /// timer re-arms at `now_ms + period`, so calling `poll` repeatedly with
    /// the same `now_ms` fires each timer at most once.
    pub fn poll(&mut self, now_ms: u64) -> Option<TimerKind> {
        let (kind, timer) = self
            .timers
            .iter_mut()
            .filter_map(|(kind, timer)| match timer.next_due_ms {
                Some(due) if due <= now_ms => Some((due, kind, timer)),
                _ => None,
            })
            .min_by_key(|(due, kind, _)| (*due, **kind))
            .map(|(_, kind, timer)| (*kind, timer))?;

        timer.next_due_ms = Some(now_ms.saturating_add(timer.period_ms));
        timer.fires = timer.fires.saturating_add(1);
        Some(kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scheduler() -> TickScheduler {
        TickScheduler::from_config(&TimingConfig::default())
    }

    fn drain(s: &mut TickScheduler, now: u64) -> Vec<TimerKind> {
        std::iter::from_fn(|| s.poll(now)).collect()
    }

    #[test]
    fn stopped_scheduler_never_fires() {
        let mut s = scheduler();
        assert!(!s.is_running());
        assert_eq!(s.active_timers(), 0);
        assert_eq!(s.poll(1_000_000), None);
    }

    #[test]
    fn start_arms_one_period_out() {
        let mut s = scheduler();
        s.start(100).unwrap();
        assert!(s.is_running());
        assert_eq!(s.active_timers(), 3);
        assert_eq!(s.next_due(TimerKind::Blips), Some(3100));
        assert_eq!(s.next_due(TimerKind::Acoustic), Some(900));
        assert_eq!(s.next_due(TimerKind::Telemetry), Some(2100));
        assert_eq!(s.poll(899), None);
        assert_eq!(s.poll(900), Some(TimerKind::Acoustic));
    }

    #[test]
    fn double_start_is_rejected_without_change() {
        let mut s = scheduler();
        s.start(0).unwrap();
        assert_eq!(s.start(500), Err(LifecycleError::AlreadyRunning));
        assert_eq!(s.next_due(TimerKind::Acoustic), Some(800));
        assert_eq!(s.active_timers(), 3);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut s = scheduler();
        assert!(!s.stop());
        s.start(0).unwrap();
        assert!(s.stop());
        assert!(!s.stop());
        assert_eq!(s.active_timers(), 0);
        assert_eq!(s.next_due(TimerKind::Blips), None);
    }

    #[test]
    fn ties_resolve_in_fixed_order() {
        let config = TimingConfig {
            blip_period_ms: 1000,
            acoustic_period_ms: 1000,
            telemetry_period_ms: 1000,
            ..TimingConfig::default()
        };
        let mut s = TickScheduler::from_config(&config);
        s.start(0).unwrap();
        assert_eq!(
            drain(&mut s, 1000),
            vec![TimerKind::Blips, TimerKind::Acoustic, TimerKind::Telemetry]
        );
    }

    #[test]
    fn earliest_due_fires_first() {
        let mut s = scheduler();
        s.start(0).unwrap();
        // Acoustic due 800, telemetry 2000, blips 3000: all overdue at 5000.
        assert_eq!(
            drain(&mut s, 5000),
            vec![TimerKind::Acoustic, TimerKind::Telemetry, TimerKind::Blips]
        );
    }

    #[test]
    fn stall_does_not_replay_missed_fires() {
        let mut s = scheduler();
        s.start(0).unwrap();
        // Ten acoustic periods pass with no poll.
        let fired = drain(&mut s, 8000);
        assert_eq!(fired.iter().filter(|k| **k == TimerKind::Acoustic).count(), 1);
        assert_eq!(s.next_due(TimerKind::Acoustic), Some(8800));
    }

    #[test]
    fn fixed_delay_counts_over_time() {
        let mut s = scheduler();
        s.start(0).unwrap();
        for now in (0..=6000).step_by(100) {
            drain(&mut s, now);
        }
        assert_eq!(s.fire_count(TimerKind::Acoustic), 7);
        assert_eq!(s.fire_count(TimerKind::Telemetry), 3);
        assert_eq!(s.fire_count(TimerKind::Blips), 2);
    }

    #[test]
    fn restart_rearms_from_new_start() {
        let mut s = scheduler();
        s.start(0).unwrap();
        s.stop();
        s.start(10_000).unwrap();
        assert_eq!(s.next_due(TimerKind::Acoustic), Some(10_800));
        assert_eq!(drain(&mut s, 10_799), vec![]);
    }

    #[test]
    fn timer_kind_display() {
        assert_eq!(TimerKind::Blips.to_string(), "blips");
        assert_eq!(TimerKind::ALL.len(), 3);
    }
}
