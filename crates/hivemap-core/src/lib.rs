//! Simulation, scheduling, and animation state engine for the HIVE-MAP
//! search-and-rescue display.
//!
//! The engine fabricates three independent data feeds on fixed-delay timers,
//! derives voice detection from the acoustic feed, and keeps the radar sweep,
//! status blink, and edge-triggered alert flash animations in step. Hosts
//! pump it once per frame and render the [`Frame`] it returns.
//!
//! # Modules
//!
//! - [`acoustic`] -- Waveform generation and voice detection.
//! - [`animation`] -- Interpolation specs and the three display channels.
//! - [`clock`] -- [`Clock`] trait with manual and monotonic sources.
//! - [`config`] -- Configuration loading from `hivemap-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Shared stop flag, time limit, and host action queue.
//! - [`engine`] -- The [`Engine`] that ties timers, simulators, and
//!   published snapshots together.
//! - [`hooks`] -- Host callbacks for emergency stop and calibrate.
//! - [`projector`] -- Polar-to-screen projection and radar layout.
//! - [`readout`] -- Label, banner, and bar readouts.
//! - [`runner`] -- The async real-time frame loop.
//! - [`scheduler`] -- The three refresh timers.
//! - [`sensor_field`] -- Victim and rescuer blip generation.
//! - [`telemetry`] -- Position random walk, air quality, device count.
//!
//! [`Frame`]: engine::Frame
//! [`Clock`]: clock::Clock
//! [`Engine`]: engine::Engine

pub mod acoustic;
pub mod animation;
pub mod clock;
pub mod config;
pub mod control;
pub mod engine;
pub mod hooks;
pub mod projector;
pub mod readout;
pub mod runner;
pub mod scheduler;
pub mod sensor_field;
pub mod telemetry;
