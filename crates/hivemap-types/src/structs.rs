//! Snapshot structs published by the engine.
//!
//! Every snapshot is immutable once built. The engine replaces a whole
//! snapshot on refresh and never edits one in place, so a reader holding a
//! snapshot always sees a consistent bundle.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AirQuality, AlertPhase, BlipKind};
use crate::ids::BlipId;

// ---------------------------------------------------------------------------
// Proximity field
// ---------------------------------------------------------------------------

/// One simulated Bluetooth proximity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BlipEntity {
    /// Identifier, unique within its snapshot only.
    pub id: BlipId,
    /// Victim or rescuer.
    pub kind: BlipKind,
    /// Bearing in degrees, `[0, 360)`, 0 pointing up.
    pub angle_degrees: f64,
    /// Estimated range in meters.
    pub distance: f64,
    /// Received signal strength in dBm.
    pub rssi_dbm: i32,
}

impl BlipEntity {
    /// Whether this reading belongs to a victim.
    pub fn is_victim(&self) -> bool {
        self.kind == BlipKind::Victim
    }
}

/// The full set of blips from one refresh.
///
/// Order carries no meaning, and nothing in one snapshot is related to any
/// entity in another: each refresh is an independent sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BlipSnapshot {
    /// Readings in this refresh.
    pub entities: Vec<BlipEntity>,
}

impl BlipSnapshot {
    /// Number of blips of the given kind.
    pub fn count(&self, kind: BlipKind) -> usize {
        self.entities.iter().filter(|b| b.kind == kind).count()
    }

    /// The first victim in the snapshot, used for the floating readout.
    pub fn primary_victim(&self) -> Option<&BlipEntity> {
        self.entities.iter().find(|b| b.is_victim())
    }

    /// Iterate over blips of one kind.
    pub fn of_kind(&self, kind: BlipKind) -> impl Iterator<Item = &BlipEntity> {
        self.entities.iter().filter(move |b| b.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Acoustic
// ---------------------------------------------------------------------------

/// Amplitude samples from one acoustic refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WaveformSnapshot {
    /// Normalised amplitudes, one per spectrum bar.
    pub samples: Vec<f64>,
}

impl WaveformSnapshot {
    /// Largest sample, or `None` for an empty waveform.
    pub fn peak(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    /// Indices of samples strictly above `level`.
    pub fn hot_bars(&self, level: f64) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > level)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Voice detection derived from a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VoiceDetectionState {
    /// Whether the waveform peak crossed the detection threshold.
    pub detected: bool,
    /// Match confidence in percent. `None` unless `detected`.
    pub match_percent: Option<u8>,
}

impl VoiceDetectionState {
    /// The state reported when nothing is heard.
    pub const fn silent() -> Self {
        Self {
            detected: false,
            match_percent: None,
        }
    }
}

/// A waveform and the detection derived from it, published as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AcousticSnapshot {
    /// The raw spectrum samples.
    pub waveform: WaveformSnapshot,
    /// Detection state computed from `waveform`.
    pub voice: VoiceDetectionState,
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Environmental telemetry at the handheld unit.
///
/// Unlike blips and waveforms this evolves from the previous value: the
/// position performs a small random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TelemetrySnapshot {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Coarse air quality.
    pub air_quality: AirQuality,
    /// Mesh devices in range.
    pub device_count: u32,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A 2D position in render space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RenderPoint {
    /// Horizontal coordinate, growing right.
    pub x: f64,
    /// Vertical coordinate, growing down.
    pub y: f64,
}

/// Values of the three animation channels at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnimationFrame {
    /// Radar sweep rotation in degrees, `[0, 360)`.
    pub sweep_degrees: f64,
    /// Opacity of the scanning status badge.
    pub status_opacity: f64,
    /// Opacity of the voice alert banner.
    pub alert_opacity: f64,
    /// Phase of the alert channel.
    pub alert_phase: AlertPhase,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn blip(kind: BlipKind, seed: u8) -> BlipEntity {
        BlipEntity {
            id: BlipId::from_random_bytes([seed; 16]),
            kind,
            angle_degrees: 90.0,
            distance: 1.0,
            rssi_dbm: -60,
        }
    }

    #[test]
    fn primary_victim_is_first_victim() {
        let snap = BlipSnapshot {
            entities: vec![
                blip(BlipKind::Rescuer, 1),
                blip(BlipKind::Victim, 2),
                blip(BlipKind::Victim, 3),
            ],
        };
        assert_eq!(snap.primary_victim().unwrap().id, BlipId::from_random_bytes([2; 16]));
        assert_eq!(snap.count(BlipKind::Victim), 2);
        assert_eq!(snap.count(BlipKind::Rescuer), 1);
    }

    #[test]
    fn empty_snapshot_has_no_primary_victim() {
        assert!(BlipSnapshot::default().primary_victim().is_none());
    }

    #[test]
    fn waveform_peak_and_hot_bars() {
        let wave = WaveformSnapshot {
            samples: vec![0.2, 0.95, 0.5, 0.91],
        };
        assert_eq!(wave.peak().unwrap(), 0.95);
        assert_eq!(wave.hot_bars(0.9), vec![1, 3]);
        assert!(WaveformSnapshot::default().peak().is_none());
    }

    #[test]
    fn silent_voice_has_no_match() {
        let v = VoiceDetectionState::silent();
        assert!(!v.detected);
        assert!(v.match_percent.is_none());
        assert_eq!(v, VoiceDetectionState::default());
    }
}
