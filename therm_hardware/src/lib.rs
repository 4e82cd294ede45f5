#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware seams behind the `therm_traits` interfaces.
//!
//! The default build carries only the host-side simulation backends;
//! the `hardware` feature adds the Raspberry Pi MCP3008/GPIO backend.

pub mod error;
pub mod pins;
pub mod sim;

#[cfg(feature = "hardware")]
pub mod mcp3008;

pub use error::HwError;
pub use pins::{AnalogModeGuard, PinMode, PinModeControl};
pub use sim::{SimulatedAnalog, SimulatedRelay, SimulatedTouch, TouchWindow};
