#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Operator-facing rendering behind the `Display` seam.
//!
//! `ConsoleDisplay` writes the status region and button states as
//! plain lines, one per poll, suitable for a terminal or a log pipe.
//! Bring-up verifies the configured panel controller ID the same way
//! the TFT path does, so a miswired or absent panel fails fast in
//! both backends.

use std::io::Write;

use therm_traits::Display;
use thiserror::Error;

/// Panel controller IDs the driver knows how to bring up.
pub const KNOWN_CONTROLLER_IDS: &[u16] = &[0x9325, 0x9328, 0x9341, 0x7575, 0x8357];

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("unknown display controller id {0:#06x}")]
    UnknownController(u16),
    #[error("render io: {0}")]
    Io(#[from] std::io::Error),
}

/// Format a temperature that may be unavailable (no valid reading yet).
fn fmt_temp(t: f64) -> String {
    if t.is_finite() {
        format!("{t:.1}C")
    } else {
        "--.-C".to_string()
    }
}

/// Line-oriented display for simulation and headless operation.
pub struct ConsoleDisplay<W: Write> {
    out: W,
    controller_id: u16,
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, controller_id: u16) -> Self {
        Self { out, controller_id }
    }

    fn status_line(temperature_c: f64, setpoint_c: f64, label: &str) -> String {
        format!(
            "temp {} | set {} | {label}",
            fmt_temp(temperature_c),
            fmt_temp(setpoint_c)
        )
    }
}

impl ConsoleDisplay<std::io::Stdout> {
    pub fn stdout(controller_id: u16) -> Self {
        Self::new(std::io::stdout(), controller_id)
    }
}

impl<W: Write> Display for ConsoleDisplay<W> {
    fn init(
        &mut self,
        temperature_c: f64,
        setpoint_c: f64,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !KNOWN_CONTROLLER_IDS.contains(&self.controller_id) {
            return Err(Box::new(DisplayError::UnknownController(
                self.controller_id,
            )));
        }
        tracing::debug!(id = format_args!("{:#06x}", self.controller_id), "display up");
        writeln!(
            self.out,
            "display {:#06x} | {}",
            self.controller_id,
            Self::status_line(temperature_c, setpoint_c, label)
        )
        .map_err(DisplayError::Io)?;
        Ok(())
    }

    fn update(
        &mut self,
        temperature_c: f64,
        setpoint_c: f64,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        writeln!(
            self.out,
            "{}",
            Self::status_line(temperature_c, setpoint_c, label)
        )
        .map_err(DisplayError::Io)?;
        Ok(())
    }

    fn draw_button(
        &mut self,
        label: &str,
        pressed: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let face = if pressed { "pressed" } else { "released" };
        writeln!(self.out, "button [{label}] {face}").map_err(DisplayError::Io)?;
        Ok(())
    }
}
