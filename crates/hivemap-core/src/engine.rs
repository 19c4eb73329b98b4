//! The simulation engine: timers, simulators, and published snapshots.
//!
//! An [`Engine`] is a self-contained instance of the display's state. It owns
//! its random source, its clock, and three published snapshot cells. The
//! host calls [`Engine::pump`] whenever it likes (typically once per render
//! frame); every timer that has come due is fired in order and its snapshot
//! replaced wholesale. Rendering reads a [`Frame`], which bundles the three
//! current snapshots with the animation values sampled at the same instant.
//!
//! Nothing outside the engine can mutate a snapshot. Readers hold `Arc`s to
//! the value that was current when they asked, so a refresh can never be
//! observed half-applied.

use std::sync::Arc;

use hivemap_types::{AcousticSnapshot, AnimationFrame, BlipSnapshot, TelemetrySnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::acoustic::AcousticSimulator;
use crate::animation::{AlertTransition, AnimationTimelineController};
use crate::clock::Clock;
use crate::config::{ConfigError, HivemapConfig};
use crate::hooks::{ActionHooks, NoOpHooks};
use crate::projector::{ProjectedBlip, RadarGeometry};
use crate::scheduler::{LifecycleError, TickScheduler, TimerKind};
use crate::sensor_field::SensorFieldSimulator;
use crate::telemetry::TelemetrySimulator;

/// A value replaced wholesale on every write, with a write counter.
#[derive(Debug)]
pub struct Published<T> {
    value: Arc<T>,
    version: u64,
}

impl<T> Published<T> {
    /// Wrap the initial value at version 0.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            version: 0,
        }
    }

    /// Replace the value and return the new version.
    pub fn publish(&mut self, value: T) -> u64 {
        self.value = Arc::new(value);
        self.version = self.version.saturating_add(1);
        self.version
    }

    /// The current value.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }

    /// Number of writes since construction.
    pub const fn version(&self) -> u64 {
        self.version
    }
}

/// Write counters of the three snapshot cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotVersions {
    /// Blip snapshot writes.
    pub blips: u64,
    /// Acoustic snapshot writes.
    pub acoustic: u64,
    /// Telemetry snapshot writes.
    pub telemetry: u64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Engine time the frame was taken at.
    pub now_ms: u64,
    /// Current proximity field.
    pub blips: Arc<BlipSnapshot>,
    /// Current waveform and voice detection.
    pub acoustic: Arc<AcousticSnapshot>,
    /// Current telemetry.
    pub telemetry: Arc<TelemetrySnapshot>,
    /// Animation channels sampled at `now_ms`.
    pub animation: AnimationFrame,
    /// Write counters, for change detection.
    pub versions: SnapshotVersions,
}

/// What a call to [`Engine::pump`] did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PumpSummary {
    /// Engine time of the pump.
    pub now_ms: u64,
    /// Timers fired, in firing order.
    pub fired: Vec<TimerKind>,
    /// Alert edge produced by an acoustic refresh, if any.
    pub alert: Option<AlertTransition>,
}

impl PumpSummary {
    /// Whether nothing fired.
    pub fn is_idle(&self) -> bool {
        self.fired.is_empty()
    }
}

/// One independent instance of the display state engine.
pub struct Engine<C: Clock, R: Rng = StdRng> {
    config: HivemapConfig,
    clock: C,
    rng: R,
    sensor_field: SensorFieldSimulator,
    acoustic: AcousticSimulator,
    telemetry: TelemetrySimulator,
    geometry: RadarGeometry,
    scheduler: TickScheduler,
    animation: AnimationTimelineController,
    blips: Published<BlipSnapshot>,
    acoustic_snapshot: Published<AcousticSnapshot>,
    telemetry_snapshot: Published<TelemetrySnapshot>,
    hooks: Box<dyn ActionHooks>,
    last_now_ms: u64,
}

impl<C: Clock> Engine<C, StdRng> {
    /// Build an engine whose random source is seeded from `config.engine.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn seeded(config: HivemapConfig, clock: C) -> Result<Self, ConfigError> {
        let rng = StdRng::seed_from_u64(config.engine.seed);
        Self::new(config, clock, rng)
    }
}

impl<C: Clock, R: Rng> Engine<C, R> {
    /// Build a stopped engine and publish the initial snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: HivemapConfig, clock: C, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry =
            RadarGeometry::for_viewport(config.radar.viewport_width, config.radar.max_distance)?;

        let sensor_field = SensorFieldSimulator::new();
        let acoustic = AcousticSimulator::from_config(&config.acoustic);
        let telemetry = TelemetrySimulator::from_config(&config.telemetry);

        let blips = Published::new(sensor_field.generate(&mut rng));
        let acoustic_snapshot = Published::new(acoustic.initial(&mut rng));
        let telemetry_snapshot = Published::new(telemetry.initial());

        let scheduler = TickScheduler::from_config(&config.timing);
        let animation = AnimationTimelineController::from_config(&config.animation);
        let last_now_ms = clock.now_ms();

        debug!(
            blips = blips.load().entities.len(),
            seed = config.engine.seed,
            "engine constructed"
        );

        Ok(Self {
            config,
            clock,
            rng,
            sensor_field,
            acoustic,
            telemetry,
            geometry,
            scheduler,
            animation,
            blips,
            acoustic_snapshot,
            telemetry_snapshot,
            hooks: Box::new(NoOpHooks),
            last_now_ms,
        })
    }

    /// Install the host's action hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl ActionHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &HivemapConfig {
        &self.config
    }

    /// Radar layout in use.
    pub const fn geometry(&self) -> &RadarGeometry {
        &self.geometry
    }

    /// Timer state, read-only.
    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Whether the timers and animations are running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Number of alert flash runs started since construction.
    pub const fn alert_activations(&self) -> u64 {
        self.animation.alert_activations()
    }

    /// Current proximity field.
    pub fn blips(&self) -> Arc<BlipSnapshot> {
        self.blips.load()
    }

    /// Current waveform and voice detection.
    pub fn acoustic(&self) -> Arc<AcousticSnapshot> {
        self.acoustic_snapshot.load()
    }

    /// Current telemetry.
    pub fn telemetry(&self) -> Arc<TelemetrySnapshot> {
        self.telemetry_snapshot.load()
    }

    /// Write counters of the three snapshots.
    pub const fn versions(&self) -> SnapshotVersions {
        SnapshotVersions {
            blips: self.blips.version(),
            acoustic: self.acoustic_snapshot.version(),
            telemetry: self.telemetry_snapshot.version(),
        }
    }

    /// Arm the three timers and start the looping animations.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] if already started.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        let now_ms = self.advance_now();
        self.scheduler.start(now_ms)?;
        self.animation.start(now_ms);
        info!(now_ms, "engine started");
        Ok(())
    }

    /// Cancel every timer and animation. Returns `false` if already stopped.
    ///
    /// No snapshot changes after this returns until the next `start`.
    pub fn stop(&mut self) -> bool {
        let timers = self.scheduler.stop();
        let animations = self.animation.stop();
        let was_running = timers || animations;
        if was_running {
            info!(now_ms = self.last_now_ms, "engine stopped");
        }
        was_running
    }

    /// Fire every timer that is due and publish the results.
    pub fn pump(&mut self) -> PumpSummary {
        let now_ms = self.advance_now();
        let mut summary = PumpSummary {
            now_ms,
            ..PumpSummary::default()
        };
        while let Some(kind) = self.scheduler.poll(now_ms) {
            if let Some(edge) = self.fire(kind, now_ms) {
                summary.alert = Some(edge);
            }
            summary.fired.push(kind);
        }
        summary
    }

    /// The current snapshots and animation values.
    pub fn frame(&self) -> Frame {
        let now_ms = self.now();
        Frame {
            now_ms,
            blips: self.blips.load(),
            acoustic: self.acoustic_snapshot.load(),
            telemetry: self.telemetry_snapshot.load(),
            animation: self.animation.sample(now_ms),
            versions: self.versions(),
        }
    }

    /// Every current blip with its radar position.
    pub fn projected_blips(&self) -> Vec<ProjectedBlip> {
        self.geometry.project_snapshot(&self.blips.load())
    }

    /// Forward an emergency stop to the host hooks.
    pub fn emergency_stop(&mut self) {
        info!("emergency stop requested");
        self.hooks.on_emergency_stop();
    }

    /// Forward a calibrate request to the host hooks.
    pub fn calibrate(&mut self) {
        info!("calibration requested");
        self.hooks.on_calibrate();
    }

    fn fire(&mut self, kind: TimerKind, now_ms: u64) -> Option<AlertTransition> {
        match kind {
            TimerKind::Blips => {
                let snapshot = self.sensor_field.generate(&mut self.rng);
                let count = snapshot.entities.len();
                let version = self.blips.publish(snapshot);
                debug!(now_ms, version, count, "blips refreshed");
                None
            }
            TimerKind::Acoustic => {
                let snapshot = self.acoustic.generate(&mut self.rng);
                let detected = snapshot.voice.detected;
                let version = self.acoustic_snapshot.publish(snapshot);
                debug!(now_ms, version, detected, "acoustic refreshed");
                self.animation.observe_detection(detected, now_ms)
            }
            TimerKind::Telemetry => {
                let previous = self.telemetry_snapshot.load();
                let next = self.telemetry.advance(&previous, &mut self.rng);
                let version = self.telemetry_snapshot.publish(next);
                debug!(now_ms, version, air = %next.air_quality, "telemetry refreshed");
                None
            }
        }
    }

    fn now(&self) -> u64 {
        self.clock.now_ms().max(self.last_now_ms)
    }

    fn advance_now(&mut self) -> u64 {
        self.last_now_ms = self.now();
        self.last_now_ms
    }
}

impl<C: Clock, R: Rng> std::fmt::Debug for Engine<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.is_running())
            .field("last_now_ms", &self.last_now_ms)
            .field("versions", &self.versions())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use hivemap_types::{AirQuality, AlertPhase, VoiceDetectionState};
    use rand::rngs::SmallRng;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AcousticConfig;

    fn engine(config: HivemapConfig) -> (Engine<ManualClock, SmallRng>, ManualClock) {
        let clock = ManualClock::new(0);
        let engine = Engine::new(config, clock.clone(), SmallRng::seed_from_u64(7)).unwrap();
        (engine, clock)
    }

    fn loud_config() -> HivemapConfig {
        HivemapConfig {
            acoustic: AcousticConfig {
                amplitude_min: 0.95,
                amplitude_max: 1.0,
                ..AcousticConfig::default()
            },
            ..HivemapConfig::default()
        }
    }

    #[test]
    fn initial_snapshots_are_published() {
        let (engine, _) = engine(HivemapConfig::default());
        let frame = engine.frame();
        assert_eq!(frame.versions, SnapshotVersions::default());
        assert!(frame.blips.primary_victim().is_some());

        assert_eq!(frame.acoustic.waveform.samples.len(), 24);
        assert!(
            frame
                .acoustic
                .waveform
                .samples
                .iter()
                .all(|s| (0.3..=0.7).contains(s))
        );
        assert_eq!(frame.acoustic.voice, VoiceDetectionState::silent());

        assert_eq!(frame.telemetry.latitude, 41.0082);
        assert_eq!(frame.telemetry.device_count, 12);
        assert_eq!(frame.telemetry.air_quality, AirQuality::Good);
        assert!(!engine.is_running());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = HivemapConfig::default();
        config.timing.acoustic_period_ms = 0;
        let result = Engine::new(config, ManualClock::new(0), SmallRng::seed_from_u64(1));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn pump_while_stopped_does_nothing() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        clock.advance(60_000);
        assert!(engine.pump().is_idle());
        assert_eq!(engine.versions(), SnapshotVersions::default());
    }

    #[test]
    fn first_fire_is_acoustic() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        engine.start().unwrap();
        clock.advance(799);
        assert!(engine.pump().is_idle());
        clock.advance(1);
        let summary = engine.pump();
        assert_eq!(summary.fired, vec![TimerKind::Acoustic]);
        assert_eq!(
            engine.versions(),
            SnapshotVersions {
                blips: 0,
                acoustic: 1,
                telemetry: 0,
            }
        );
    }

    #[test]
    fn refresh_counts_follow_periods() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        engine.start().unwrap();
        for _ in 0..60 {
            clock.advance(100);
            engine.pump();
        }
        assert_eq!(
            engine.versions(),
            SnapshotVersions {
                blips: 2,
                acoustic: 7,
                telemetry: 3,
            }
        );
    }

    #[test]
    fn double_start_is_an_error() {
        let (mut engine, _) = engine(HivemapConfig::default());
        engine.start().unwrap();
        assert_eq!(engine.start(), Err(LifecycleError::AlreadyRunning));
    }

    #[test]
    fn stop_freezes_snapshots_and_rests_animation() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        engine.start().unwrap();
        clock.advance(1000);
        engine.pump();
        let before = engine.frame();

        assert!(engine.stop());
        assert!(!engine.stop());
        clock.advance(30_000);
        assert!(engine.pump().is_idle());

        let after = engine.frame();
        assert_eq!(after.versions, before.versions);
        assert!(Arc::ptr_eq(&after.blips, &before.blips));
        assert_eq!(after.animation.sweep_degrees, 0.0);
        assert_eq!(after.animation.status_opacity, 1.0);
        assert_eq!(after.animation.alert_opacity, 0.0);
    }

    #[test]
    fn held_reader_never_sees_later_writes() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        let held = engine.blips();
        let copy = (*held).clone();
        engine.start().unwrap();
        clock.advance(3000);
        engine.pump();
        assert_eq!(engine.versions().blips, 1);
        assert_eq!(*held, copy);
    }

    #[test]
    fn telemetry_walk_starts_from_previous() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        engine.start().unwrap();
        clock.advance(2000);
        engine.pump();
        let t = engine.telemetry();
        assert!((t.latitude - 41.0082).abs() <= 0.000_05 + 1e-12);
        assert!((10..=15).contains(&t.device_count));
    }

    #[test]
    fn backwards_clock_does_not_rewind() {
        let (mut engine, clock) = engine(HivemapConfig::default());
        engine.start().unwrap();
        clock.set(5000);
        engine.pump();
        clock.set(1000);
        assert_eq!(engine.frame().now_ms, 5000);
        assert!(engine.pump().is_idle());
    }

    #[test]
    fn held_detection_flashes_once() {
        let (mut engine, clock) = engine(loud_config());
        engine.start().unwrap();
        clock.advance(800);
        assert_eq!(engine.pump().alert, Some(AlertTransition::Started));
        assert_eq!(
            engine.frame().animation.alert_phase,
            AlertPhase::Flashing {
                remaining_repeats: 4
            }
        );
        for _ in 0..5 {
            clock.advance(800);
            assert_eq!(engine.pump().alert, None);
        }
        assert_eq!(engine.alert_activations(), 1);
        assert!(engine.acoustic().voice.detected);
    }

    #[test]
    fn projected_blips_cover_snapshot() {
        let (engine, _) = engine(HivemapConfig::default());
        let projected = engine.projected_blips();
        assert_eq!(projected.len(), engine.blips().entities.len());
        let max = engine.geometry().max_radius();
        let center = engine.geometry().center();
        for p in projected {
            let r = (p.position.x - center.x).hypot(p.position.y - center.y);
            assert!(r <= max);
        }
    }

    #[derive(Clone, Default)]
    struct Counting {
        stops: Arc<AtomicU32>,
        calibrations: Arc<AtomicU32>,
    }

    impl ActionHooks for Counting {
        fn on_emergency_stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn on_calibrate(&mut self) {
            self.calibrations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn actions_reach_hooks_without_touching_state() {
        let hooks = Counting::default();
        let (engine, _) = engine(HivemapConfig::default());
        let mut engine = engine.with_hooks(hooks.clone());
        engine.emergency_stop();
        engine.calibrate();
        engine.calibrate();
        assert_eq!(hooks.stops.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.calibrations.load(Ordering::SeqCst), 2);
        assert_eq!(engine.versions(), SnapshotVersions::default());
        assert!(!engine.is_running());
    }

    #[test]
    fn seeded_engines_agree() {
        let a_clock = ManualClock::new(0);
        let b_clock = ManualClock::new(0);
        let mut a = Engine::seeded(HivemapConfig::default(), a_clock.clone()).unwrap();
        let mut b = Engine::seeded(HivemapConfig::default(), b_clock.clone()).unwrap();
        a.start().unwrap();
        b.start().unwrap();
        for _ in 0..40 {
            a_clock.advance(250);
            b_clock.advance(250);
            a.pump();
            b.pump();
            assert_eq!(a.frame(), b.frame());
        }
    }
}
