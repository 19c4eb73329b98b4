//! Animation timeline: interpolated values driven by elapsed time.
//!
//! An [`AnimationSpec`] describes a value moving `from -> to` over a fixed
//! duration with an easing curve, repeated a finite or infinite number of
//! legs, optionally reversing direction on every other leg (ping-pong).
//! Evaluating a spec is a pure function of elapsed milliseconds, so nothing
//! needs to tick between render frames.
//!
//! The [`AnimationTimelineController`] owns the three display channels:
//!
//! | Channel      | Range        | Leg     | Easing      | Repeat   | Ping-pong |
//! |--------------|--------------|---------|-------------|----------|-----------|
//! | Sweep        | 0 -> 360     | 4000 ms | linear      | infinite | no        |
//! | Status blink | 1.0 -> 0.4   | 600 ms  | ease in/out | infinite | yes       |
//! | Alert flash  | 1.0 -> 0.3   | 300 ms  | ease in/out | 4 cycles | yes       |
//!
//! One alert cycle is two legs (bright -> dim -> bright), so the default run
//! lasts 2400 ms and settles at full opacity.
//!
//! Sweep and blink run for as long as the engine runs. The alert flash is
//! edge-triggered by voice detection: a `false -> true` transition starts a
//! run, a `true -> false` transition cancels it and snaps the opacity to 0,
//! and a detection that simply stays on leaves the current run alone.

use hivemap_types::{AlertPhase, AnimationFrame};
use tracing::debug;

use crate::config::AnimationConfig;

const SWEEP_FROM: f64 = 0.0;
const SWEEP_TO: f64 = 360.0;
const BLINK_BRIGHT: f64 = 1.0;
const BLINK_DIM: f64 = 0.4;
const FLASH_BRIGHT: f64 = 1.0;
const FLASH_DIM: f64 = 0.3;
const ALERT_IDLE: f64 = 0.0;
const LEGS_PER_FLASH_CYCLE: u32 = 2;

/// Interpolation curve applied within each leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Quadratic ease in and out.
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    #[allow(clippy::suboptimal_flops)]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = 2.0 - 2.0 * t;
                    1.0 - u * u / 2.0
                }
            }
        }
    }
}

/// How many legs an animation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Exactly this many legs, then hold.
    Count(u32),
    /// Forever.
    Infinite,
}

/// Declarative description of an animated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    /// Value at the start of a forward leg.
    pub from: f64,
    /// Value at the end of a forward leg.
    pub to: f64,
    /// Length of one leg in milliseconds.
    pub duration_ms: u64,
    /// Curve within each leg.
    pub easing: Easing,
    /// Number of legs.
    pub repeat: Repeat,
    /// Reverse direction on odd legs instead of snapping back to `from`.
    pub ping_pong: bool,
}

impl AnimationSpec {
    /// Total play time, or `None` for an infinite animation.
    pub fn total_ms(&self) -> Option<u64> {
        match self.repeat {
            Repeat::Count(n) => Some(self.duration_ms.saturating_mul(u64::from(n))),
            Repeat::Infinite => None,
        }
    }

    /// Value held once a finite animation has played every leg.
    ///
    /// A ping-pong run with an even leg count ends back at `from`.
    pub const fn settled_value(&self) -> f64 {
        match self.repeat {
            Repeat::Count(0) => self.from,
            Repeat::Count(n) if self.ping_pong && n % 2 == 0 => self.from,
            Repeat::Count(_) | Repeat::Infinite => self.to,
        }
    }

    /// Whether every leg has played by `elapsed_ms`.
    pub fn is_finished(&self, elapsed_ms: u64) -> bool {
        self.total_ms().is_some_and(|total| elapsed_ms >= total)
    }

    /// Legs still to play at `elapsed_ms` (`None` if infinite).
    pub fn remaining_repeats(&self, elapsed_ms: u64) -> Option<u32> {
        match self.repeat {
            Repeat::Count(n) => {
                let done = u32::try_from(self.leg_index(elapsed_ms)).unwrap_or(u32::MAX);
                Some(n.saturating_sub(done))
            }
            Repeat::Infinite => None,
        }
    }

    /// Interpolated value `elapsed_ms` after the animation started.
    #[allow(clippy::cast_precision_loss)]
    pub fn value_at(&self, elapsed_ms: u64) -> f64 {
        if self.duration_ms == 0 || self.is_finished(elapsed_ms) {
            return self.settled_value();
        }
        let leg = self.leg_index(elapsed_ms);
        let within = elapsed_ms.checked_rem(self.duration_ms).unwrap_or(0);
        let progress = self.easing.apply(within as f64 / self.duration_ms as f64);

        let reversed = self.ping_pong && leg.checked_rem(2) == Some(1);
        let (start, end) = if reversed {
            (self.to, self.from)
        } else {
            (self.from, self.to)
        };
        (end - start).mul_add(progress, start)
    }

    fn leg_index(&self, elapsed_ms: u64) -> u64 {
        elapsed_ms.checked_div(self.duration_ms).unwrap_or(0)
    }
}

/// A channel that loops for as long as it runs.
#[derive(Debug, Clone, PartialEq)]
struct LoopChannel {
    spec: AnimationSpec,
    rest_value: f64,
    started_at_ms: Option<u64>,
}

impl LoopChannel {
    const fn new(spec: AnimationSpec, rest_value: f64) -> Self {
        Self {
            spec,
            rest_value,
            started_at_ms: None,
        }
    }

    const fn start(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
    }

    const fn stop(&mut self) {
        self.started_at_ms = None;
    }

    fn value(&self, now_ms: u64) -> f64 {
        self.started_at_ms.map_or(self.rest_value, |start| {
            self.spec.value_at(now_ms.saturating_sub(start))
        })
    }
}

/// Edge reported by [`AnimationTimelineController::observe_detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    /// Detection turned on; a new flash run began.
    Started,
    /// Detection turned off; the flash was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertState {
    Idle,
    Flashing { started_at_ms: u64 },
}

/// Edge-triggered alert flash.
#[derive(Debug, Clone, PartialEq)]
struct AlertFlashChannel {
    spec: AnimationSpec,
    state: AlertState,
    previous_detected: bool,
    activations: u64,
}

impl AlertFlashChannel {
    const fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            state: AlertState::Idle,
            previous_detected: false,
            activations: 0,
        }
    }

    fn observe(&mut self, detected: bool, now_ms: u64) -> Option<AlertTransition> {
        let previous = std::mem::replace(&mut self.previous_detected, detected);
        match (previous, detected) {
            (false, true) => {
                self.state = AlertState::Flashing {
                    started_at_ms: now_ms,
                };
                self.activations = self.activations.saturating_add(1);
                Some(AlertTransition::Started)
            }
            (true, false) => {
                self.state = AlertState::Idle;
                Some(AlertTransition::Cancelled)
            }
            _ => None,
        }
    }

    const fn reset(&mut self) {
        self.state = AlertState::Idle;
        self.previous_detected = false;
    }

    fn value(&self, now_ms: u64) -> f64 {
        match self.state {
            AlertState::Idle => ALERT_IDLE,
            AlertState::Flashing { started_at_ms } => {
                self.spec.value_at(now_ms.saturating_sub(started_at_ms))
            }
        }
    }

    fn phase(&self, now_ms: u64) -> AlertPhase {
        match self.state {
            AlertState::Idle => AlertPhase::Idle,
            AlertState::Flashing { started_at_ms } => AlertPhase::Flashing {
                remaining_repeats: self
                    .spec
                    .remaining_repeats(now_ms.saturating_sub(started_at_ms))
                    .map_or(u32::MAX, |legs| legs.div_ceil(LEGS_PER_FLASH_CYCLE)),
            },
        }
    }
}

/// Owner of the sweep, status blink, and alert flash channels.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTimelineController {
    sweep: LoopChannel,
    blink: LoopChannel,
    alert: AlertFlashChannel,
    running: bool,
}

impl AnimationTimelineController {
    /// Build the three channels from configuration.
    pub const fn from_config(config: &AnimationConfig) -> Self {
        let sweep = AnimationSpec {
            from: SWEEP_FROM,
            to: SWEEP_TO,
            duration_ms: config.sweep_period_ms,
            easing: Easing::Linear,
            repeat: Repeat::Infinite,
            ping_pong: false,
        };
        let blink = AnimationSpec {
            from: BLINK_BRIGHT,
            to: BLINK_DIM,
            duration_ms: config.blink_leg_ms,
            easing: Easing::EaseInOut,
            repeat: Repeat::Infinite,
            ping_pong: true,
        };
        let flash = AnimationSpec {
            from: FLASH_BRIGHT,
            to: FLASH_DIM,
            duration_ms: config.flash_leg_ms,
            easing: Easing::EaseInOut,
            repeat: Repeat::Count(config.flash_repeats.saturating_mul(LEGS_PER_FLASH_CYCLE)),
            ping_pong: true,
        };
        Self {
            sweep: LoopChannel::new(sweep, SWEEP_FROM),
            blink: LoopChannel::new(blink, BLINK_BRIGHT),
            alert: AlertFlashChannel::new(flash),
            running: false,
        }
    }

    /// Whether the looping channels are running.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Start sweep and blink at `now_ms`. Returns `false` if already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.running {
            return false;
        }
        self.sweep.start(now_ms);
        self.blink.start(now_ms);
        self.running = true;
        debug!(now_ms, "animation channels started");
        true
    }

    /// Stop every channel and return them to their rest values.
    ///
    /// The alert also forgets the last detection, so the first detection
    /// after a restart counts as a fresh edge.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.sweep.stop();
        self.blink.stop();
        self.alert.reset();
        self.running = false;
        debug!("animation channels stopped");
        true
    }

    /// Feed the latest voice detection level. Ignored while stopped.
    pub fn observe_detection(&mut self, detected: bool, now_ms: u64) -> Option<AlertTransition> {
        if !self.running {
            return None;
        }
        let transition = self.alert.observe(detected, now_ms);
        if let Some(edge) = transition {
            debug!(?edge, now_ms, activations = self.alert.activations, "alert edge");
        }
        transition
    }

    /// Number of flash runs started so far.
    pub const fn alert_activations(&self) -> u64 {
        self.alert.activations
    }

    /// Current phase of the alert channel.
    pub fn alert_phase(&self, now_ms: u64) -> AlertPhase {
        self.alert.phase(now_ms)
    }

    /// Sample all three channels at `now_ms`.
    pub fn sample(&self, now_ms: u64) -> AnimationFrame {
        AnimationFrame {
            sweep_degrees: self.sweep.value(now_ms),
            status_opacity: self.blink.value(now_ms),
            alert_opacity: self.alert.value(now_ms),
            alert_phase: self.alert.phase(now_ms),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::suboptimal_flops,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn controller() -> AnimationTimelineController {
        AnimationTimelineController::from_config(&AnimationConfig::default())
    }

    fn flash_spec() -> AnimationSpec {
        AnimationSpec {
            from: 1.0,
            to: 0.3,
            duration_ms: 300,
            easing: Easing::EaseInOut,
            repeat: Repeat::Count(8),
            ping_pong: true,
        }
    }

    #[test]
    fn easing_endpoints_and_midpoint() {
        for easing in [Easing::Linear, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert!((easing.apply(0.5) - 0.5).abs() < EPS);
        }
        assert!(Easing::EaseInOut.apply(0.25) < 0.25);
        assert!(Easing::EaseInOut.apply(0.75) > 0.75);
    }

    #[test]
    fn linear_infinite_restarts_at_from() {
        let sweep = AnimationSpec {
            from: 0.0,
            to: 360.0,
            duration_ms: 4000,
            easing: Easing::Linear,
            repeat: Repeat::Infinite,
            ping_pong: false,
        };
        assert_eq!(sweep.value_at(0), 0.0);
        assert!((sweep.value_at(1000) - 90.0).abs() < EPS);
        assert!((sweep.value_at(3999) - 359.91).abs() < EPS);
        assert_eq!(sweep.value_at(4000), 0.0);
        assert!((sweep.value_at(42_000) - 180.0).abs() < EPS);
        assert!(!sweep.is_finished(u64::MAX));
    }

    #[test]
    fn ping_pong_reverses_instead_of_snapping() {
        let spec = flash_spec();
        assert_eq!(spec.value_at(0), 1.0);
        assert!((spec.value_at(150) - 0.65).abs() < EPS);
        assert!((spec.value_at(300) - 0.3).abs() < EPS);
        assert!((spec.value_at(450) - 0.65).abs() < EPS);
        assert!((spec.value_at(600) - 1.0).abs() < EPS);
    }

    #[test]
    fn finite_run_settles_and_holds() {
        let spec = flash_spec();
        assert_eq!(spec.total_ms(), Some(2400));
        assert!(!spec.is_finished(2399));
        assert!(spec.is_finished(2400));
        assert_eq!(spec.value_at(2400), 1.0);
        assert_eq!(spec.value_at(60_000), 1.0);

        let odd = AnimationSpec {
            repeat: Repeat::Count(3),
            ..flash_spec()
        };
        assert_eq!(odd.value_at(900), 0.3);
    }

    #[test]
    fn remaining_repeats_count_down() {
        let spec = flash_spec();
        assert_eq!(spec.remaining_repeats(0), Some(8));
        assert_eq!(spec.remaining_repeats(299), Some(8));
        assert_eq!(spec.remaining_repeats(300), Some(7));
        assert_eq!(spec.remaining_repeats(2399), Some(1));
        assert_eq!(spec.remaining_repeats(5000), Some(0));
    }

    #[test]
    fn stopped_controller_rests() {
        let c = controller();
        let frame = c.sample(12_345);
        assert_eq!(frame.sweep_degrees, 0.0);
        assert_eq!(frame.status_opacity, 1.0);
        assert_eq!(frame.alert_opacity, 0.0);
        assert_eq!(frame.alert_phase, AlertPhase::Idle);
    }

    #[test]
    fn running_channels_follow_start_time() {
        let mut c = controller();
        assert!(c.start(10_000));
        assert!(!c.start(10_500));

        let frame = c.sample(11_000);
        assert!((frame.sweep_degrees - 90.0).abs() < EPS);
        // 1000 ms into the blink: second leg (dim -> bright), 400/600 through.
        let expected = 0.4 + 0.6 * Easing::EaseInOut.apply(400.0 / 600.0);
        assert!((frame.status_opacity - expected).abs() < EPS);
        assert_eq!(frame.alert_opacity, 0.0);
    }

    #[test]
    fn blink_oscillates_between_bounds() {
        let mut c = controller();
        c.start(0);
        for t in (0..5000).step_by(37) {
            let v = c.sample(t).status_opacity;
            assert!((0.4 - EPS..=1.0 + EPS).contains(&v), "t={t} v={v}");
        }
    }

    #[test]
    fn detection_edges_drive_flash() {
        let mut c = controller();
        c.start(0);

        let levels = [false, false, true, true, false, true];
        let mut transitions = Vec::new();
        for (i, detected) in levels.into_iter().enumerate() {
            let now = 800 * (u64::try_from(i).unwrap() + 1);
            transitions.push(c.observe_detection(detected, now));
        }

        assert_eq!(
            transitions,
            vec![
                None,
                None,
                Some(AlertTransition::Started),
                None,
                Some(AlertTransition::Cancelled),
                Some(AlertTransition::Started),
            ]
        );
        assert_eq!(c.alert_activations(), 2);
    }

    #[test]
    fn held_detection_does_not_restart_run() {
        let mut c = controller();
        c.start(0);
        c.observe_detection(true, 1000);
        assert_eq!(c.sample(1000).alert_opacity, 1.0);

        assert_eq!(c.observe_detection(true, 1800), None);
        // Still timed from the edge at 1000: two cycles left at 2350.
        let mid = c.sample(2350);
        assert!((mid.alert_opacity - 0.65).abs() < EPS);
        assert_eq!(mid.alert_phase, AlertPhase::Flashing { remaining_repeats: 2 });

        assert_eq!(c.observe_detection(true, 2600), None);
        assert_eq!(c.sample(3400).alert_phase, AlertPhase::Flashing { remaining_repeats: 0 });
        assert_eq!(c.sample(3400).alert_opacity, 1.0);
        assert_eq!(c.alert_activations(), 1);
    }

    #[test]
    fn flash_run_plays_full_cycles() {
        let mut c = controller();
        c.start(0);
        c.observe_detection(true, 800);

        let expected = [
            (800, 4),
            (1100, 4),
            (1400, 3),
            (2000, 2),
            (2600, 1),
            (3199, 1),
            (3200, 0),
        ];
        for (now, cycles) in expected {
            assert_eq!(
                c.sample(now).alert_phase,
                AlertPhase::Flashing {
                    remaining_repeats: cycles
                },
                "now={now}"
            );
        }

        // Dim trough at the middle of every cycle.
        for now in [1100, 1700, 2300, 2900] {
            assert!((c.sample(now).alert_opacity - 0.3).abs() < EPS, "now={now}");
        }
        assert!(c.sample(2150).alert_opacity < 0.99);
        assert_eq!(c.sample(3200).alert_opacity, 1.0);
        assert_eq!(c.sample(9000).alert_opacity, 1.0);
    }

    #[test]
    fn cancel_mid_flash_snaps_to_zero() {
        let mut c = controller();
        c.start(0);
        c.observe_detection(true, 800);
        let mid = c.sample(950);
        assert!(mid.alert_opacity > 0.3 && mid.alert_opacity < 1.0);
        assert_eq!(mid.alert_phase, AlertPhase::Flashing { remaining_repeats: 4 });

        assert_eq!(c.observe_detection(false, 1000), Some(AlertTransition::Cancelled));
        assert_eq!(c.sample(1000).alert_opacity, 0.0);
        assert_eq!(c.sample(1000).alert_phase, AlertPhase::Idle);
    }

    #[test]
    fn stop_resets_everything_and_ignores_detection() {
        let mut c = controller();
        c.start(0);
        c.observe_detection(true, 800);
        assert!(c.stop());
        assert!(!c.stop());

        let frame = c.sample(900);
        assert_eq!(frame.alert_opacity, 0.0);
        assert_eq!(frame.sweep_degrees, 0.0);
        assert_eq!(c.observe_detection(true, 1000), None);

        // After a restart the held detection is a fresh edge.
        c.start(2000);
        assert_eq!(c.observe_detection(true, 2800), Some(AlertTransition::Started));
        assert_eq!(c.alert_activations(), 2);
    }
}
