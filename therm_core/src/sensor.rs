//! Thermistor sensing: raw ADC averaging, divider inversion, and the
//! calibration polynomial in ln(R).
//!
//! Both divider orientations appear on real boards, so the topology is
//! a configuration choice rather than a code path fork. Invalid
//! physical readings surface as `SensorError` and are never converted
//! into a temperature.

use std::time::Duration;

use therm_traits::{AnalogInput, Clock};

use crate::error::{BuildError, SensorError};

pub const KELVIN_OFFSET: f64 = 273.15;

/// Which leg of the divider the thermistor occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerTopology {
    /// Thermistor between supply and the measured node:
    /// `R = Rf * (Vin / Vout - 1)`
    ThermistorHigh,
    /// Thermistor between the measured node and ground:
    /// `R = Rf * Vout / (Vin - Vout)`
    ThermistorLow,
}

impl From<therm_config::Topology> for DividerTopology {
    fn from(t: therm_config::Topology) -> Self {
        match t {
            therm_config::Topology::High => DividerTopology::ThermistorHigh,
            therm_config::Topology::Low => DividerTopology::ThermistorLow,
        }
    }
}

/// Calibration polynomial producing inverse absolute temperature from
/// ln(R).
#[derive(Debug, Clone, PartialEq)]
pub enum Polynomial {
    /// Classic three-term Steinhart-Hart: `1/T = a + b*lnR + c*lnR^3`
    SteinhartHart { a: f64, b: f64, c: f64 },
    /// Power series `1/T = sum(c[i] * lnR^i)`; the bench-fit variant
    /// uses seven coefficients (degree six)
    Series(Vec<f64>),
}

impl Polynomial {
    /// Inverse absolute temperature (1/K) at the given ln(R).
    pub fn inverse_temperature(&self, ln_r: f64) -> f64 {
        match self {
            Polynomial::SteinhartHart { a, b, c } => a + b * ln_r + c * ln_r.powi(3),
            Polynomial::Series(coeffs) => {
                // Horner evaluation, highest order first
                coeffs.iter().rev().fold(0.0, |acc, c| acc * ln_r + c)
            }
        }
    }
}

impl From<&therm_config::PolynomialCfg> for Polynomial {
    fn from(p: &therm_config::PolynomialCfg) -> Self {
        match p {
            therm_config::PolynomialCfg::SteinhartHart { a, b, c } => Polynomial::SteinhartHart {
                a: *a,
                b: *b,
                c: *c,
            },
            therm_config::PolynomialCfg::Series { coefficients } => {
                Polynomial::Series(coefficients.clone())
            }
        }
    }
}

/// Sensing parameters; immutable after build.
#[derive(Debug, Clone)]
pub struct SensorCfg {
    pub channel: u8,
    /// Raw reads averaged per temperature sample; must be >= 1
    pub samples: u32,
    /// Inter-sample settling delay
    pub settle: Duration,
    pub resolution_bits: u8,
    pub reference_voltage: f64,
    pub supply_voltage: f64,
    pub fixed_resistance_ohms: f64,
    pub topology: DividerTopology,
    pub polynomial: Polynomial,
}

impl SensorCfg {
    pub fn from_config(cfg: &therm_config::Config) -> Self {
        Self {
            channel: cfg.pins.thermistor_channel,
            samples: cfg.adc.samples,
            settle: Duration::from_millis(cfg.adc.settle_ms),
            resolution_bits: cfg.adc.resolution_bits,
            reference_voltage: cfg.adc.reference_voltage,
            supply_voltage: cfg.sensor.supply_voltage,
            fixed_resistance_ohms: cfg.sensor.fixed_resistance_ohms,
            topology: cfg.sensor.topology.into(),
            polynomial: (&cfg.sensor.polynomial).into(),
        }
    }
}

/// Converts noisy raw ADC samples into a calibrated temperature.
#[derive(Debug, Clone)]
pub struct SensorReader {
    cfg: SensorCfg,
    max_count: f64,
}

impl SensorReader {
    pub fn new(cfg: SensorCfg) -> Result<Self, BuildError> {
        if cfg.samples == 0 {
            return Err(BuildError::InvalidConfig("adc sample count must be >= 1"));
        }
        if !(1..=16).contains(&cfg.resolution_bits) {
            return Err(BuildError::InvalidConfig("adc resolution out of range"));
        }
        if !(cfg.reference_voltage.is_finite() && cfg.reference_voltage > 0.0) {
            return Err(BuildError::InvalidConfig("reference voltage must be > 0"));
        }
        if !(cfg.supply_voltage.is_finite() && cfg.supply_voltage > 0.0) {
            return Err(BuildError::InvalidConfig("supply voltage must be > 0"));
        }
        if !(cfg.fixed_resistance_ohms.is_finite() && cfg.fixed_resistance_ohms > 0.0) {
            return Err(BuildError::InvalidConfig("fixed resistance must be > 0"));
        }
        let max_count = f64::from((1u32 << cfg.resolution_bits) - 1);
        Ok(Self { cfg, max_count })
    }

    pub fn cfg(&self) -> &SensorCfg {
        &self.cfg
    }

    /// Average `samples` raw reads and scale to volts.
    ///
    /// Deterministic given deterministic raw reads; the settling delay
    /// between reads goes through the clock so tests stay instant.
    pub fn average_voltage<A: AnalogInput>(
        &self,
        adc: &mut A,
        clock: &dyn Clock,
    ) -> Result<f64, SensorError> {
        let mut total: u64 = 0;
        for i in 0..self.cfg.samples {
            let raw = adc
                .read(self.cfg.channel)
                .map_err(|e| SensorError::Analog(e.to_string()))?;
            total += u64::from(raw);
            if i + 1 < self.cfg.samples {
                clock.sleep(self.cfg.settle);
            }
        }
        let avg = total as f64 / f64::from(self.cfg.samples);
        Ok(avg * (self.cfg.reference_voltage / self.max_count))
    }

    /// One calibrated temperature reading in Celsius.
    pub fn read_temperature<A: AnalogInput>(
        &self,
        adc: &mut A,
        clock: &dyn Clock,
    ) -> Result<f64, SensorError> {
        let vout = self.average_voltage(adc, clock)?;
        let ohms = self.resistance_from(vout)?;
        let inv_t = self.cfg.polynomial.inverse_temperature(ohms.ln());
        if !inv_t.is_finite() || inv_t <= 0.0 {
            return Err(SensorError::NonFiniteReading);
        }
        let celsius = 1.0 / inv_t - KELVIN_OFFSET;
        if !celsius.is_finite() {
            return Err(SensorError::NonFiniteReading);
        }
        tracing::trace!(vout, ohms, celsius, "thermistor sample");
        Ok(celsius)
    }

    /// Invert the divider to recover the thermistor resistance.
    fn resistance_from(&self, vout: f64) -> Result<f64, SensorError> {
        let vin = self.cfg.supply_voltage;
        let rf = self.cfg.fixed_resistance_ohms;
        let ohms = match self.cfg.topology {
            DividerTopology::ThermistorHigh => rf * (vin / vout - 1.0),
            DividerTopology::ThermistorLow => rf * vout / (vin - vout),
        };
        if !ohms.is_finite() || ohms <= 0.0 {
            return Err(SensorError::ResistanceOutOfRange { ohms });
        }
        Ok(ohms)
    }
}
