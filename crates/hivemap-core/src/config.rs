//! Configuration loading and typed config structures for the HIVE-MAP engine.
//!
//! The canonical configuration lives in `hivemap-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file yields the stock mission
//! display.

use std::path::Path;

use serde::Deserialize;

use crate::sensor_field::MAX_BLIP_DISTANCE;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `hivemap-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HivemapConfig {
    /// Engine-wide settings (random seed).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Timer periods and render frame interval.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Waveform generation and voice detection.
    #[serde(default)]
    pub acoustic: AcousticConfig,

    /// Starting position and random-walk parameters.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Radar viewport geometry.
    #[serde(default)]
    pub radar: RadarConfig,

    /// Animation channel timing.
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Host run boundaries.
    #[serde(default)]
    pub run: RunConfig,
}

impl HivemapConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HIVEMAP_SEED` overrides `engine.seed` when set to a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml rejects a document with no content; treat it as all defaults.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.engine.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every range constraint the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        for (name, value) in [
            ("timing.blip_period_ms", t.blip_period_ms),
            ("timing.acoustic_period_ms", t.acoustic_period_ms),
            ("timing.telemetry_period_ms", t.telemetry_period_ms),
            ("timing.frame_interval_ms", t.frame_interval_ms),
            ("animation.sweep_period_ms", self.animation.sweep_period_ms),
            ("animation.blink_leg_ms", self.animation.blink_leg_ms),
            ("animation.flash_leg_ms", self.animation.flash_leg_ms),
        ] {
            if value == 0 {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }

        let a = &self.acoustic;
        if a.sample_count == 0 {
            return Err(invalid("acoustic.sample_count must be at least 1".to_owned()));
        }
        if !unit_range_ordered(a.amplitude_min, a.amplitude_max) {
            return Err(invalid(format!(
                "acoustic amplitude range [{}, {}] must be ordered and inside [0, 1]",
                a.amplitude_min, a.amplitude_max
            )));
        }
        if !unit_range_ordered(a.initial_amplitude_min, a.initial_amplitude_max) {
            return Err(invalid(format!(
                "acoustic initial amplitude range [{}, {}] must be ordered and inside [0, 1]",
                a.initial_amplitude_min, a.initial_amplitude_max
            )));
        }
        if !a.detection_threshold.is_finite() {
            return Err(invalid("acoustic.detection_threshold must be finite".to_owned()));
        }

        let tel = &self.telemetry;
        if !(0.0..=1.0).contains(&tel.poor_air_probability) {
            return Err(invalid(format!(
                "telemetry.poor_air_probability {} must be inside [0, 1]",
                tel.poor_air_probability
            )));
        }
        if !(tel.drift.is_finite() && tel.drift >= 0.0) {
            return Err(invalid("telemetry.drift must be a non-negative number".to_owned()));
        }

        if !(self.radar.max_distance >= MAX_BLIP_DISTANCE) {
            return Err(invalid(format!(
                "radar.max_distance {} must cover the blip range (>= {MAX_BLIP_DISTANCE})",
                self.radar.max_distance
            )));
        }
        if !(self.radar.viewport_width.is_finite() && self.radar.viewport_width > 0.0) {
            return Err(invalid("radar.viewport_width must be positive".to_owned()));
        }

        Ok(())
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Random seed for reproducible runs.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl EngineConfig {
    /// Override the seed with `HIVEMAP_SEED` when it parses as `u64`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var("HIVEMAP_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Periods of the three refresh timers and the render frame interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Milliseconds between proximity field refreshes.
    #[serde(default = "default_blip_period_ms")]
    pub blip_period_ms: u64,

    /// Milliseconds between waveform refreshes.
    #[serde(default = "default_acoustic_period_ms")]
    pub acoustic_period_ms: u64,

    /// Milliseconds between telemetry steps.
    #[serde(default = "default_telemetry_period_ms")]
    pub telemetry_period_ms: u64,

    /// Milliseconds between rendered frames in the host loop.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            blip_period_ms: default_blip_period_ms(),
            acoustic_period_ms: default_acoustic_period_ms(),
            telemetry_period_ms: default_telemetry_period_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

/// Waveform generation and voice detection parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AcousticConfig {
    /// Samples per waveform.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Lower bound of a refreshed sample.
    #[serde(default = "default_amplitude_min")]
    pub amplitude_min: f64,

    /// Upper bound of a refreshed sample.
    #[serde(default = "default_amplitude_max")]
    pub amplitude_max: f64,

    /// Lower bound of the samples shown before the first refresh.
    #[serde(default = "default_initial_amplitude_min")]
    pub initial_amplitude_min: f64,

    /// Upper bound of the samples shown before the first refresh.
    #[serde(default = "default_initial_amplitude_max")]
    pub initial_amplitude_max: f64,

    /// A peak strictly above this value counts as a voice.
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f64,
}

impl Default for AcousticConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            amplitude_min: default_amplitude_min(),
            amplitude_max: default_amplitude_max(),
            initial_amplitude_min: default_initial_amplitude_min(),
            initial_amplitude_max: default_initial_amplitude_max(),
            detection_threshold: default_detection_threshold(),
        }
    }
}

/// Telemetry start state and random-walk parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelemetryConfig {
    /// Starting latitude in decimal degrees.
    #[serde(default = "default_start_latitude")]
    pub start_latitude: f64,

    /// Starting longitude in decimal degrees.
    #[serde(default = "default_start_longitude")]
    pub start_longitude: f64,

    /// Device count shown before the first step.
    #[serde(default = "default_initial_device_count")]
    pub initial_device_count: u32,

    /// Maximum per-step change of latitude and of longitude.
    #[serde(default = "default_drift")]
    pub drift: f64,

    /// Chance that a step reports poor air.
    #[serde(default = "default_poor_air_probability")]
    pub poor_air_probability: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            start_latitude: default_start_latitude(),
            start_longitude: default_start_longitude(),
            initial_device_count: default_initial_device_count(),
            drift: default_drift(),
            poor_air_probability: default_poor_air_probability(),
        }
    }
}

/// Radar viewport geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RadarConfig {
    /// Width of the hosting viewport in points.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,

    /// Range in meters mapped to the outer ring.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            max_distance: default_max_distance(),
        }
    }
}

/// Animation channel timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimationConfig {
    /// Milliseconds for one full radar sweep.
    #[serde(default = "default_sweep_period_ms")]
    pub sweep_period_ms: u64,

    /// Milliseconds per leg of the status blink.
    #[serde(default = "default_blink_leg_ms")]
    pub blink_leg_ms: u64,

    /// Milliseconds per leg of the voice alert flash.
    #[serde(default = "default_flash_leg_ms")]
    pub flash_leg_ms: u64,

    /// Bright-dim-bright cycles played by one alert flash run.
    #[serde(default = "default_flash_repeats")]
    pub flash_repeats: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            sweep_period_ms: default_sweep_period_ms(),
            blink_leg_ms: default_blink_leg_ms(),
            flash_leg_ms: default_flash_leg_ms(),
            flash_repeats: default_flash_repeats(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Host run boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Wall-clock seconds before the host stops the display (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

// ---------------------------------------------------------------------------
// Helpers and defaults
// ---------------------------------------------------------------------------

const fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

fn unit_range_ordered(min: f64, max: f64) -> bool {
    (0.0..=1.0).contains(&min) && (0.0..=1.0).contains(&max) && min <= max
}

const fn default_seed() -> u64 {
    42
}

const fn default_blip_period_ms() -> u64 {
    3000
}

const fn default_acoustic_period_ms() -> u64 {
    800
}

const fn default_telemetry_period_ms() -> u64 {
    2000
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_sample_count() -> usize {
    24
}

const fn default_amplitude_min() -> f64 {
    0.2
}

const fn default_amplitude_max() -> f64 {
    0.9
}

const fn default_initial_amplitude_min() -> f64 {
    0.3
}

const fn default_initial_amplitude_max() -> f64 {
    0.7
}

const fn default_detection_threshold() -> f64 {
    0.92
}

const fn default_start_latitude() -> f64 {
    41.0082
}

const fn default_start_longitude() -> f64 {
    28.9784
}

const fn default_initial_device_count() -> u32 {
    12
}

const fn default_drift() -> f64 {
    0.000_05
}

const fn default_poor_air_probability() -> f64 {
    0.15
}

const fn default_viewport_width() -> f64 {
    390.0
}

const fn default_max_distance() -> f64 {
    3.5
}

const fn default_sweep_period_ms() -> u64 {
    4000
}

const fn default_blink_leg_ms() -> u64 {
    600
}

const fn default_flash_leg_ms() -> u64 {
    300
}

const fn default_flash_repeats() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}
