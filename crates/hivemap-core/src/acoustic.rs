//! Simulated acoustic spectrum and voice detection.
//!
//! Every refresh draws an independent set of amplitude samples; there is no
//! smoothing or memory between refreshes, so detection can flicker from one
//! refresh to the next. The alert animation reacts to edges only, which is
//! what keeps the display steady under that noise.
//!
//! A voice is detected when the waveform peak is strictly above the
//! threshold. The match confidence is then `min(98, floor(90 + peak * 10))`.

use std::ops::RangeInclusive;

use hivemap_types::{AcousticSnapshot, VoiceDetectionState, WaveformSnapshot};
use rand::Rng;

use crate::config::AcousticConfig;

/// Confidence reported for a peak of 0.
const MATCH_BASE: f64 = 90.0;

/// Confidence points per unit of peak amplitude.
const MATCH_SCALE: f64 = 10.0;

/// Highest confidence ever reported.
pub const MATCH_CEILING: u8 = 98;

/// Derive the detection state from a waveform.
///
/// An empty waveform is silent.
pub fn detect_voice(waveform: &WaveformSnapshot, threshold: f64) -> VoiceDetectionState {
    match waveform.peak() {
        Some(peak) if peak > threshold => VoiceDetectionState {
            detected: true,
            match_percent: Some(match_percent(peak)),
        },
        _ => VoiceDetectionState::silent(),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
fn match_percent(peak: f64) -> u8 {
    let raw = (MATCH_BASE + peak * MATCH_SCALE).floor();
    // Clamped to [0, 98] first, so the cast is exact.
    raw.clamp(0.0, f64::from(MATCH_CEILING)) as u8
}

/// Generator of waveform snapshots.
#[derive(Debug, Clone)]
pub struct AcousticSimulator {
    sample_count: usize,
    amplitude: RangeInclusive<f64>,
    initial_amplitude: RangeInclusive<f64>,
    threshold: f64,
}

impl AcousticSimulator {
    /// Create a simulator from validated configuration.
    pub fn from_config(config: &AcousticConfig) -> Self {
        Self {
            sample_count: config.sample_count,
            amplitude: config.amplitude_min..=config.amplitude_max,
            initial_amplitude: config.initial_amplitude_min..=config.initial_amplitude_max,
            threshold: config.detection_threshold,
        }
    }

    /// Detection threshold in use.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The calmer waveform shown before the first refresh. Detection is
    /// reported silent regardless of the samples.
    pub fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> AcousticSnapshot {
        AcousticSnapshot {
            waveform: self.draw(rng, &self.initial_amplitude),
            voice: VoiceDetectionState::silent(),
        }
    }

    /// Draw a fresh waveform and derive its detection state.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> AcousticSnapshot {
        let waveform = self.draw(rng, &self.amplitude);
        let voice = detect_voice(&waveform, self.threshold);
        AcousticSnapshot { waveform, voice }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R, range: &RangeInclusive<f64>) -> WaveformSnapshot {
        let samples = (0..self.sample_count)
            .map(|_| rng.random_range(range.clone()))
            .collect();
        WaveformSnapshot { samples }
    }
}
