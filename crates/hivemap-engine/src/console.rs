//! Console rendering of published frames.
//!
//! The headless host has no screen, so [`ConsoleRenderer`] turns each
//! snapshot change into a structured log line. Snapshots that did not
//! change since the previous frame are skipped using the publication
//! version counters; animation values are only emitted at trace level.

use hivemap_core::animation::AlertTransition;
use hivemap_core::engine::{Frame, PumpSummary, SnapshotVersions};
use hivemap_core::hooks::ActionHooks;
use hivemap_core::projector::RadarGeometry;
use hivemap_core::readout::{
    self, HOT_BAR_LEVEL, SCANNING_STATUS, format_coordinate, victim_label, voice_alert_text,
};
use hivemap_core::runner::FrameConsumer;
use hivemap_types::BlipKind;
use tracing::{info, trace, warn};

/// Frame consumer that logs every snapshot change.
#[derive(Debug)]
pub struct ConsoleRenderer {
    geometry: RadarGeometry,
    last_versions: Option<SnapshotVersions>,
}

impl ConsoleRenderer {
    /// Create a renderer projecting through `geometry`.
    pub const fn new(geometry: RadarGeometry) -> Self {
        Self {
            geometry,
            last_versions: None,
        }
    }

    fn render_blips(&self, frame: &Frame) {
        let blips = &frame.blips;
        let victim = blips.primary_victim();
        info!(
            version = frame.versions.blips,
            victims = blips.count(BlipKind::Victim),
            rescuers = blips.count(BlipKind::Rescuer),
            label = %victim.map(victim_label).unwrap_or_default(),
            "Proximity field"
        );
        if let Some(victim) = victim {
            let position = self.geometry.project(victim);
            let anchor = self.geometry.label_anchor(position);
            trace!(
                x = position.x,
                y = position.y,
                label_x = anchor.x,
                label_y = anchor.y,
                "Primary victim placement"
            );
        }
    }

    fn render_acoustic(frame: &Frame) {
        let acoustic = &frame.acoustic;
        let bars: Vec<f64> = acoustic
            .waveform
            .samples
            .iter()
            .map(|s| readout::bar_height(*s))
            .collect();
        info!(
            version = frame.versions.acoustic,
            peak = acoustic.waveform.peak().unwrap_or_default(),
            hot_bars = acoustic.waveform.hot_bars(HOT_BAR_LEVEL).len(),
            detected = acoustic.voice.detected,
            "Audio spectrum"
        );
        trace!(?bars, "Spectrum bar heights");
    }

    fn render_telemetry(frame: &Frame) {
        let t = &frame.telemetry;
        info!(
            version = frame.versions.telemetry,
            lat = %format_coordinate(t.latitude),
            long = %format_coordinate(t.longitude),
            air = %t.air_quality,
            devices = t.device_count,
            "Telemetry"
        );
    }
}

impl FrameConsumer for ConsoleRenderer {
    fn on_frame(&mut self, frame: &Frame, pump: &PumpSummary) {
        let previous = self.last_versions.replace(frame.versions);
        if previous.is_none() {
            info!(status = SCANNING_STATUS, "HIVE-MAP PRO");
        }

        let changed = |current: u64, last: fn(&SnapshotVersions) -> u64| {
            previous.as_ref().is_none_or(|p| last(p) != current)
        };
        if changed(frame.versions.blips, |v| v.blips) {
            self.render_blips(frame);
        }
        if changed(frame.versions.acoustic, |v| v.acoustic) {
            Self::render_acoustic(frame);
        }
        if changed(frame.versions.telemetry, |v| v.telemetry) {
            Self::render_telemetry(frame);
        }

        match pump.alert {
            Some(AlertTransition::Started) => {
                if let Some(text) = voice_alert_text(&frame.acoustic.voice) {
                    warn!(alert = %text, "Voice alert");
                }
            }
            Some(AlertTransition::Cancelled) => info!("Voice alert cleared"),
            None => {}
        }

        trace!(
            now_ms = frame.now_ms,
            sweep = frame.animation.sweep_degrees,
            status = frame.animation.status_opacity,
            alert = frame.animation.alert_opacity,
            "Animation"
        );
    }
}

/// Action hooks that log each button press.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl ActionHooks for LoggingHooks {
    fn on_emergency_stop(&mut self) {
        warn!("EMERGENCY STOP pressed");
    }

    fn on_calibrate(&mut self) {
        info!("CALIBRATE pressed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hivemap_core::clock::ManualClock;
    use hivemap_core::config::HivemapConfig;
    use hivemap_core::engine::Engine;

    use super::*;

    #[test]
    fn renderer_tracks_last_versions() {
        let clock = ManualClock::new(0);
        let mut engine = Engine::seeded(HivemapConfig::default(), clock.clone()).unwrap();
        let mut renderer = ConsoleRenderer::new(*engine.geometry());

        engine.start().unwrap();
        let pump = engine.pump();
        renderer.on_frame(&engine.frame(), &pump);
        assert_eq!(renderer.last_versions, Some(SnapshotVersions::default()));

        clock.advance(800);
        let pump = engine.pump();
        renderer.on_frame(&engine.frame(), &pump);
        assert_eq!(renderer.last_versions.map(|v| v.acoustic), Some(1));
    }
}
