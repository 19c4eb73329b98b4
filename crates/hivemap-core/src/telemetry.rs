//! Environmental telemetry random walk.
//!
//! Telemetry is the only state carried across refreshes: each step nudges
//! latitude and longitude by an independent uniform draw in
//! `[-drift, +drift]`. Air quality and device count are redrawn from
//! scratch every step with no memory of the previous value.

use hivemap_types::{AirQuality, TelemetrySnapshot};
use rand::Rng;

use crate::config::TelemetryConfig;

/// Inclusive range of the reported mesh device count.
const DEVICE_COUNT_MIN: u32 = 10;
const DEVICE_COUNT_MAX: u32 = 15;

/// Stepper for the telemetry snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySimulator {
    start: TelemetrySnapshot,
    drift: f64,
    poor_air_probability: f64,
}

impl TelemetrySimulator {
    /// Create a simulator from validated configuration.
    pub const fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            start: TelemetrySnapshot {
                latitude: config.start_latitude,
                longitude: config.start_longitude,
                air_quality: AirQuality::Good,
                device_count: config.initial_device_count,
            },
            drift: config.drift,
            poor_air_probability: config.poor_air_probability,
        }
    }

    /// The snapshot shown before the first step.
    pub const fn initial(&self) -> TelemetrySnapshot {
        self.start
    }

    /// Produce the next snapshot from `previous`.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        previous: &TelemetrySnapshot,
        rng: &mut R,
    ) -> TelemetrySnapshot {
        let latitude = previous.latitude + rng.random_range(-self.drift..=self.drift);
        let longitude = previous.longitude + rng.random_range(-self.drift..=self.drift);
        let air_quality = if rng.random_bool(self.poor_air_probability) {
            AirQuality::Poor
        } else {
            AirQuality::Good
        };
        let device_count = rng.random_range(DEVICE_COUNT_MIN..=DEVICE_COUNT_MAX);

        TelemetrySnapshot {
            latitude,
            longitude,
            air_quality,
            device_count,
        }
    }
}
