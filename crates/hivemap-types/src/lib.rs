//! Shared type definitions for the HIVE-MAP situational-awareness engine.
//!
//! This crate holds every value the engine publishes to a presentation
//! layer. Types flow downstream to `TypeScript` via `ts-rs` for the mobile
//! dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Per-snapshot blip identifiers
//! - [`enums`] -- Blip kinds, air quality, alert phase
//! - [`structs`] -- Blip, acoustic, and telemetry snapshots plus render values

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{AirQuality, AlertPhase, BlipKind};
pub use ids::BlipId;
pub use structs::{
    AcousticSnapshot, AnimationFrame, BlipEntity, BlipSnapshot, RenderPoint, TelemetrySnapshot,
    VoiceDetectionState, WaveformSnapshot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::BlipId::export_all();

        let _ = crate::enums::BlipKind::export_all();
        let _ = crate::enums::AirQuality::export_all();
        let _ = crate::enums::AlertPhase::export_all();

        let _ = crate::structs::BlipEntity::export_all();
        let _ = crate::structs::BlipSnapshot::export_all();
        let _ = crate::structs::WaveformSnapshot::export_all();
        let _ = crate::structs::VoiceDetectionState::export_all();
        let _ = crate::structs::AcousticSnapshot::export_all();
        let _ = crate::structs::TelemetrySnapshot::export_all();
        let _ = crate::structs::RenderPoint::export_all();
        let _ = crate::structs::AnimationFrame::export_all();
    }
}
