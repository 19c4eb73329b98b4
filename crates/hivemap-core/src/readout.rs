//! Text and bar readouts shown alongside the radar.
//!
//! These are the strings a host renders verbatim: the floating label on the
//! primary victim, the voice alert banner, telemetry coordinates, and the
//! height of each spectrum bar.

use hivemap_types::{BlipEntity, VoiceDetectionState};

/// Header status line while the engine runs.
pub const SCANNING_STATUS: &str = "SCANNING... [NET-MESH: ACTIVE]";

/// Amplitude above which a spectrum bar is drawn in the alert color.
pub const HOT_BAR_LEVEL: f64 = 0.9;

/// Spectrum bar height in display units at amplitude 1.0.
const BAR_FULL_HEIGHT: f64 = 48.0;

/// Spectrum bars never shrink below this height.
const BAR_MIN_HEIGHT: f64 = 4.0;

/// Floating label for a blip, e.g. `DIST: 1.2m | RSSI: -80dBm`.
pub fn victim_label(entity: &BlipEntity) -> String {
    format!("DIST: {:.1}m | RSSI: {}dBm", entity.distance, entity.rssi_dbm)
}

/// Alert banner text, present only while a voice is detected.
pub fn voice_alert_text(voice: &VoiceDetectionState) -> Option<String> {
    match (voice.detected, voice.match_percent) {
        (true, Some(percent)) => Some(format!("HUMAN VOICE DETECTED ({percent}% MATCH)")),
        _ => None,
    }
}

/// A latitude or longitude to five decimals with a degree sign.
pub fn format_coordinate(degrees: f64) -> String {
    format!("{degrees:.5}°")
}

/// Display height of one spectrum bar.
pub fn bar_height(amplitude: f64) -> f64 {
    (amplitude * BAR_FULL_HEIGHT).max(BAR_MIN_HEIGHT)
}
