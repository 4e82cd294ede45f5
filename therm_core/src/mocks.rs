//! Test and helper mocks for therm_core.

use std::sync::{Arc, Mutex};

use therm_traits::{AnalogInput, Display, HeaterOutput, RawTouch, TouchPanel};

/// ADC that replays a scripted count sequence, repeating the last
/// value, or fails every read.
pub struct ScriptedAnalog {
    counts: Vec<u16>,
    idx: usize,
    fail: Option<&'static str>,
}

impl ScriptedAnalog {
    pub fn new(counts: impl Into<Vec<u16>>) -> Self {
        Self {
            counts: counts.into(),
            idx: 0,
            fail: None,
        }
    }

    pub fn constant(count: u16) -> Self {
        Self::new([count])
    }

    pub fn failing(msg: &'static str) -> Self {
        Self {
            counts: Vec::new(),
            idx: 0,
            fail: Some(msg),
        }
    }
}

impl AnalogInput for ScriptedAnalog {
    fn read(&mut self, _channel: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(msg) = self.fail {
            return Err(Box::new(std::io::Error::other(msg)));
        }
        let v = if self.idx < self.counts.len() {
            let x = self.counts[self.idx];
            self.idx += 1;
            x
        } else {
            self.counts.last().copied().unwrap_or(0)
        };
        Ok(v)
    }
}

/// Relay spy that records every commanded level through a shared
/// handle, so tests can inspect it after moving the spy into the
/// controller.
#[derive(Default)]
pub struct SpyHeater {
    log: Arc<Mutex<Vec<bool>>>,
}

impl SpyHeater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_handle(&self) -> Arc<Mutex<Vec<bool>>> {
        self.log.clone()
    }
}

impl HeaterOutput for SpyHeater {
    fn set_on(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.push(on);
        }
        Ok(())
    }
}

/// Touch panel replaying scripted samples; a zero-pressure sample
/// stands in for "no touch".
pub struct ScriptedTouch {
    samples: Vec<RawTouch>,
    idx: usize,
}

impl ScriptedTouch {
    pub fn new(samples: impl Into<Vec<RawTouch>>) -> Self {
        Self {
            samples: samples.into(),
            idx: 0,
        }
    }

    pub fn idle() -> Self {
        Self::new([RawTouch {
            x: 0,
            y: 0,
            pressure: 0,
        }])
    }
}

impl TouchPanel for ScriptedTouch {
    fn sample(&mut self) -> Result<RawTouch, Box<dyn std::error::Error + Send + Sync>> {
        let s = if self.idx < self.samples.len() {
            let x = self.samples[self.idx];
            self.idx += 1;
            x
        } else {
            self.samples.last().copied().unwrap_or(RawTouch {
                x: 0,
                y: 0,
                pressure: 0,
            })
        };
        Ok(s)
    }
}

/// What a display mock saw, inspectable through a shared handle.
#[derive(Debug, Default)]
pub struct DisplayLog {
    pub inits: u64,
    pub updates: u64,
    pub labels: Vec<String>,
    pub button_draws: Vec<(String, bool)>,
}

/// Display that accepts everything and records what it was asked to
/// draw.
#[derive(Default)]
pub struct NullDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_handle(&self) -> Arc<Mutex<DisplayLog>> {
        self.log.clone()
    }
}

impl Display for NullDisplay {
    fn init(
        &mut self,
        _temperature_c: f64,
        _setpoint_c: f64,
        _label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.inits += 1;
        }
        Ok(())
    }

    fn update(
        &mut self,
        _temperature_c: f64,
        _setpoint_c: f64,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.updates += 1;
            log.labels.push(label.to_string());
        }
        Ok(())
    }

    fn draw_button(
        &mut self,
        label: &str,
        pressed: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.button_draws.push((label.to_string(), pressed));
        }
        Ok(())
    }
}
