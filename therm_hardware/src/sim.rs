//! Host-side simulation backends: a first-order thermal plant behind
//! the ADC seam, a relay whose state feeds back into the plant, and a
//! touch panel replaying scheduled press windows.

use std::cell::Cell;
use std::rc::Rc;

use therm_config::{Config, PolynomialCfg, Topology};
use therm_traits::{AnalogInput, HeaterOutput, RawTouch, TouchPanel};

/// Relay whose commanded level is observable through a shared handle,
/// so the simulated plant can react to it.
#[derive(Default)]
pub struct SimulatedRelay {
    on: Rc<Cell<bool>>,
}

impl SimulatedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_handle(&self) -> Rc<Cell<bool>> {
        self.on.clone()
    }
}

impl HeaterOutput for SimulatedRelay {
    fn set_on(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.on.get() != on {
            tracing::debug!(on, "relay (simulated)");
        }
        self.on.set(on);
        Ok(())
    }
}

/// First-order thermal plant rendered through the full sensing chain:
/// plant temperature -> thermistor resistance -> divider voltage ->
/// counts.
///
/// The resistance is found by inverting the configured calibration
/// polynomial, so decoding the emitted counts through the real sensor
/// path recovers the plant temperature (up to ADC quantization).
///
/// Every `read` advances the plant one step, pulled toward the heater
/// limit while the relay is on and toward ambient while it is off, so
/// a closed loop settles around its setpoint.
pub struct SimulatedAnalog {
    heater_on: Rc<Cell<bool>>,
    temperature_c: f64,
    ambient_c: f64,
    heater_limit_c: f64,
    step_gain: f64,
    // Sensing-chain constants mirrored from the controller config
    polynomial: PolynomialCfg,
    supply_voltage: f64,
    reference_voltage: f64,
    fixed_resistance_ohms: f64,
    topology: Topology,
    max_count: u16,
}

impl SimulatedAnalog {
    /// Plant wired to a relay handle, starting at ambient.
    pub fn new(cfg: &Config, ambient_c: f64, heater_on: Rc<Cell<bool>>) -> Self {
        Self {
            heater_on,
            temperature_c: ambient_c,
            ambient_c,
            heater_limit_c: 120.0,
            step_gain: 0.02,
            polynomial: cfg.sensor.polynomial.clone(),
            supply_voltage: cfg.sensor.supply_voltage,
            reference_voltage: cfg.adc.reference_voltage,
            fixed_resistance_ohms: cfg.sensor.fixed_resistance_ohms,
            topology: cfg.sensor.topology,
            max_count: ((1u32 << cfg.adc.resolution_bits) - 1) as u16,
        }
    }

    /// Plant detached from any relay; temperature stays at ambient.
    pub fn free_running(cfg: &Config, ambient_c: f64) -> Self {
        Self::new(cfg, ambient_c, Rc::new(Cell::new(false)))
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    fn step(&mut self) {
        let target = if self.heater_on.get() {
            self.heater_limit_c
        } else {
            self.ambient_c
        };
        self.temperature_c += (target - self.temperature_c) * self.step_gain;
    }

    fn inverse_temperature(&self, ln_r: f64) -> f64 {
        match &self.polynomial {
            PolynomialCfg::SteinhartHart { a, b, c } => a + b * ln_r + c * ln_r.powi(3),
            PolynomialCfg::Series { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |acc, c| acc * ln_r + c),
        }
    }

    /// Resistance whose decoded temperature equals the plant's, by
    /// bisection: 1/T is monotonically increasing in R for an NTC
    /// calibration.
    fn resistance_ohms(&self) -> f64 {
        let target = 1.0 / (self.temperature_c + 273.15);
        let (mut lo, mut hi) = (100.0_f64.ln(), 10_000_000.0_f64.ln());
        for _ in 0..60 {
            let mid = (lo + hi) / 2.0;
            if self.inverse_temperature(mid) < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        ((lo + hi) / 2.0).exp()
    }

    fn counts(&self) -> u16 {
        let r = self.resistance_ohms();
        let rf = self.fixed_resistance_ohms;
        let v = match self.topology {
            Topology::Low => self.supply_voltage * r / (rf + r),
            Topology::High => self.supply_voltage * rf / (rf + r),
        };
        let span = f64::from(self.max_count);
        (v / self.reference_voltage * span).round().clamp(0.0, span) as u16
    }
}

impl AnalogInput for SimulatedAnalog {
    fn read(&mut self, _channel: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.step();
        Ok(self.counts())
    }
}

/// One scheduled press: held from `start_poll` through `end_poll`
/// inclusive, in raw panel coordinates.
#[derive(Debug, Clone, Copy)]
pub struct TouchWindow {
    pub start_poll: u64,
    pub end_poll: u64,
    pub x: u16,
    pub y: u16,
}

/// Touch panel replaying scheduled press windows against an internal
/// poll counter. Outside every window it reports zero pressure, which
/// the calibration layer rejects as "no touch".
pub struct SimulatedTouch {
    windows: Vec<TouchWindow>,
    pressure: u16,
    poll: u64,
}

impl SimulatedTouch {
    pub fn new(windows: Vec<TouchWindow>, pressure: u16) -> Self {
        Self {
            windows,
            pressure,
            poll: 0,
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl TouchPanel for SimulatedTouch {
    fn sample(&mut self) -> Result<RawTouch, Box<dyn std::error::Error + Send + Sync>> {
        self.poll += 1;
        let hit = self
            .windows
            .iter()
            .find(|w| (w.start_poll..=w.end_poll).contains(&self.poll));
        Ok(match hit {
            Some(w) => RawTouch {
                x: w.x,
                y: w.y,
                pressure: self.pressure,
            },
            None => RawTouch {
                x: 0,
                y: 0,
                pressure: 0,
            },
        })
    }
}
