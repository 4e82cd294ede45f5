#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core heater-control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `therm_traits` seams:
//! `AnalogInput`, `HeaterOutput`, `TouchPanel`, and `Display`.
//!
//! ## Architecture
//!
//! - **Sensing**: raw ADC averaging, divider inversion, calibration
//!   polynomial (`sensor` module)
//! - **Control**: two-threshold hysteresis state machine (`control`)
//! - **Input**: touch debounce and command dispatch (`input`)
//! - **State**: the shared per-poll record (`state`)
//! - **Orchestration**: `Controller` poll cycle (`controller`) and the
//!   `runner` loop driver

pub mod control;
pub mod controller;
pub mod error;
pub mod input;
pub mod mocks;
pub mod runner;
pub mod sensor;
pub mod state;

pub use control::{ControlLoop, HeaterMode};
pub use controller::{Controller, PollOutcome, build_controller};
pub use error::{BuildError, ControllerError, SensorError};
pub use input::{Button, ButtonAction, ButtonEvent, Edge, InputController, Rect, TouchCalibration};
pub use runner::{RunSummary, run_loop};
pub use sensor::{DividerTopology, Polynomial, SensorCfg, SensorReader};
pub use state::ControllerState;
