//! Enumeration types for the HIVE-MAP engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Proximity field
// ---------------------------------------------------------------------------

/// Who a proximity blip belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BlipKind {
    /// A person awaiting rescue. Weaker signal, farther out.
    Victim,
    /// A member of the rescue team.
    Rescuer,
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Coarse air quality reading at the device position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AirQuality {
    /// Breathable.
    Good,
    /// Dust, smoke, or gas present.
    Poor,
}

impl core::fmt::Display for AirQuality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Good => f.write_str("Good"),
            Self::Poor => f.write_str("Poor"),
        }
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Phase of the voice alert flash channel.
///
/// The channel is edge-triggered: it leaves [`AlertPhase::Idle`] only when
/// voice detection turns on, and returns to it only when detection turns
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AlertPhase {
    /// No alert. Opacity is held at 0.
    Idle,
    /// A flash run is active or has settled.
    Flashing {
        /// Full bright-dim-bright cycles still to play (0 once settled).
        remaining_repeats: u32,
    },
}

impl AlertPhase {
    /// Whether the alert is showing (running or settled).
    pub const fn is_flashing(self) -> bool {
        matches!(self, Self::Flashing { .. })
    }
}
