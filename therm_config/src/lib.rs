#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and reference-table parsing for the heater controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The reference CSV loader enforces headers and a strictly monotonic
//!   resistance/temperature relation, for verifying calibration
//!   polynomials against known pairs.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    /// ADC channel wired to the thermistor divider midpoint
    pub thermistor_channel: u8,
    /// Digital output driving the heater relay
    pub heater_pin: u8,
    /// Four-wire resistive touch lines; XM/YP are shared with the
    /// display controller and must be restored after sampling
    pub touch_xp: u8,
    pub touch_xm: u8,
    pub touch_yp: u8,
    pub touch_ym: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            thermistor_channel: 11,
            heater_pin: 33,
            touch_xp: 6,
            touch_xm: 2,
            touch_yp: 1,
            touch_ym: 7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Adc {
    /// ADC resolution in bits; raw counts span [0, 2^bits - 1]
    pub resolution_bits: u8,
    /// Measured ADC reference voltage (volts)
    pub reference_voltage: f64,
    /// Raw reads averaged per temperature sample
    pub samples: u32,
    /// Inter-sample settling delay (ms)
    pub settle_ms: u64,
}

impl Default for Adc {
    fn default() -> Self {
        Self {
            resolution_bits: 12,
            reference_voltage: 3.3,
            samples: 30,
            settle_ms: 2,
        }
    }
}

/// Which leg of the divider the thermistor occupies.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Thermistor between supply and the measured node
    High,
    /// Thermistor between the measured node and ground
    #[default]
    Low,
}

/// Resistance-to-temperature calibration polynomial in ln(R).
///
/// TOML accepts either the classic three-term Steinhart-Hart form
/// `{ a = ..., b = ..., c = ... }` or an arbitrary-order power series
/// `{ coefficients = [c0, c1, ...] }`.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum PolynomialCfg {
    SteinhartHart { a: f64, b: f64, c: f64 },
    Series { coefficients: Vec<f64> },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sensor {
    /// Measured divider supply voltage (volts)
    pub supply_voltage: f64,
    /// Fixed divider resistor, as measured (ohms)
    pub fixed_resistance_ohms: f64,
    pub topology: Topology,
    pub polynomial: PolynomialCfg,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            supply_voltage: 4.86,
            fixed_resistance_ohms: 97_000.0,
            topology: Topology::Low,
            // Bench-fit sixth-order series for the stock hotend thermistor
            polynomial: PolynomialCfg::Series {
                coefficients: vec![
                    3.5137043601e+01,
                    -2.2548090240e+01,
                    6.0079813523e+00,
                    -8.5076103273e-01,
                    6.7526011417e-02,
                    -2.8483415639e-03,
                    4.9883793734e-05,
                ],
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Control {
    /// Target temperature at startup (Celsius)
    pub setpoint_c: f64,
    /// Hysteresis half-width around the setpoint (Celsius)
    pub tolerance_c: f64,
    /// Poll cadence (ms)
    pub poll_ms: u64,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            setpoint_c: 25.0,
            tolerance_c: 1.0,
            poll_ms: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Touch {
    /// Pressure band; samples outside (min, max) are "no touch"
    pub min_pressure: u16,
    pub max_pressure: u16,
    /// Raw axis bounds mapped linearly onto screen pixels
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
    /// Panel orientation corrections
    pub swap_axes: bool,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Screen size in pixels
    pub width: u16,
    pub height: u16,
}

impl Default for Touch {
    fn default() -> Self {
        Self {
            min_pressure: 10,
            max_pressure: 2000,
            x_min: 187,
            x_max: 835,
            y_min: 135,
            y_max: 885,
            swap_axes: true,
            invert_x: false,
            invert_y: false,
            width: 320,
            height: 240,
        }
    }
}

/// What a button does when it fires.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionCfg {
    /// Add `delta` to the setpoint (may be negative)
    Adjust { delta: f64 },
    /// Toggle the master enable flag
    Power,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ButtonCfg {
    pub label: String,
    /// Button center in pixels
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub action: ActionCfg,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    /// Controller ID expected from bring-up; unrecognized IDs abort
    pub controller_id: u16,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            controller_id: 0x9341,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub adc: Adc,
    pub sensor: Sensor,
    pub control: Control,
    pub touch: Touch,
    pub buttons: Vec<ButtonCfg>,
    pub logging: Logging,
    pub display: DisplayCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pins: Pins::default(),
            adc: Adc::default(),
            sensor: Sensor::default(),
            control: Control::default(),
            touch: Touch::default(),
            buttons: default_buttons(),
            logging: Logging::default(),
            display: DisplayCfg::default(),
        }
    }
}

/// The stock five-button layout: coarse/fine setpoint nudges in a row,
/// master power below.
pub fn default_buttons() -> Vec<ButtonCfg> {
    let adjust = |label: &str, x: i32, delta: f64| ButtonCfg {
        label: label.to_string(),
        x,
        y: 120,
        width: 50,
        height: 50,
        action: ActionCfg::Adjust { delta },
    };
    vec![
        adjust("+5", 60, 5.0),
        adjust("+1", 130, 1.0),
        adjust("-1", 200, -1.0),
        adjust("-5", 270, -5.0),
        ButtonCfg {
            label: "ON".to_string(),
            x: 70,
            y: 200,
            width: 100,
            height: 50,
            action: ActionCfg::Power,
        },
    ]
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // ADC
        if self.adc.samples == 0 {
            eyre::bail!("adc.samples must be >= 1");
        }
        if !(8..=16).contains(&self.adc.resolution_bits) {
            eyre::bail!("adc.resolution_bits must be in [8, 16]");
        }
        if !(self.adc.reference_voltage.is_finite() && self.adc.reference_voltage > 0.0) {
            eyre::bail!("adc.reference_voltage must be > 0");
        }

        // Sensor
        if !(self.sensor.supply_voltage.is_finite() && self.sensor.supply_voltage > 0.0) {
            eyre::bail!("sensor.supply_voltage must be > 0");
        }
        if !(self.sensor.fixed_resistance_ohms.is_finite()
            && self.sensor.fixed_resistance_ohms > 0.0)
        {
            eyre::bail!("sensor.fixed_resistance_ohms must be > 0");
        }
        match &self.sensor.polynomial {
            PolynomialCfg::SteinhartHart { a, b, c } => {
                if ![a, b, c].iter().all(|v| v.is_finite()) {
                    eyre::bail!("sensor.polynomial coefficients must be finite");
                }
            }
            PolynomialCfg::Series { coefficients } => {
                if coefficients.len() < 2 {
                    eyre::bail!("sensor.polynomial needs at least two coefficients");
                }
                if !coefficients.iter().all(|v| v.is_finite()) {
                    eyre::bail!("sensor.polynomial coefficients must be finite");
                }
            }
        }

        // Control
        if !(self.control.tolerance_c.is_finite() && self.control.tolerance_c > 0.0) {
            eyre::bail!("control.tolerance_c must be > 0");
        }
        if !self.control.setpoint_c.is_finite() {
            eyre::bail!("control.setpoint_c must be finite");
        }
        if self.control.poll_ms == 0 {
            eyre::bail!("control.poll_ms must be >= 1");
        }

        // Touch
        if self.touch.min_pressure >= self.touch.max_pressure {
            eyre::bail!("touch.min_pressure must be < touch.max_pressure");
        }
        if self.touch.x_min == self.touch.x_max || self.touch.y_min == self.touch.y_max {
            eyre::bail!("touch axis calibration bounds must not be degenerate");
        }
        if self.touch.width == 0 || self.touch.height == 0 {
            eyre::bail!("touch.width and touch.height must be > 0");
        }

        // Buttons
        if self.buttons.is_empty() {
            eyre::bail!("at least one button must be configured");
        }
        for (i, b) in self.buttons.iter().enumerate() {
            if b.width <= 0 || b.height <= 0 {
                eyre::bail!("buttons[{i}] must have positive width and height");
            }
            if let ActionCfg::Adjust { delta } = b.action
                && !(delta.is_finite() && delta != 0.0)
            {
                eyre::bail!("buttons[{i}].action.delta must be finite and non-zero");
            }
        }

        Ok(())
    }
}

/// Reference CSV schema.
///
/// Expected headers:
/// ohms,celsius
///
/// Example:
/// ohms,celsius
/// 97000,25.0
/// 12100,85.0
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReferenceRow {
    pub ohms: f64,
    pub celsius: f64,
}

/// Load a resistance/temperature reference table with strict headers.
///
/// Rows must be strictly monotonic: temperature increasing, resistance
/// decreasing (NTC behavior). The table is what calibration
/// polynomials are verified against.
pub fn load_reference_csv(path: &std::path::Path) -> eyre::Result<Vec<ReferenceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open reference CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["ohms", "celsius"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "reference CSV must have headers 'ohms,celsius', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ReferenceRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ReferenceRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        };
        if !(row.ohms.is_finite() && row.ohms > 0.0) {
            eyre::bail!("CSV row {}: ohms must be > 0", idx + 2);
        }
        if let Some(prev) = rows.last() {
            if row.celsius <= prev.celsius {
                eyre::bail!("CSV row {}: celsius values must strictly increase", idx + 2);
            }
            if row.ohms >= prev.ohms {
                eyre::bail!("CSV row {}: ohms values must strictly decrease", idx + 2);
            }
        }
        rows.push(row);
    }

    if rows.len() < 2 {
        eyre::bail!("reference table requires at least two rows, got {}", rows.len());
    }
    Ok(rows)
}
