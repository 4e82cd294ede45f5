use thiserror::Error;

/// Invalid physical reading. Policy: discard, keep the previous heater
/// mode, retry on the next poll. Never actuate on one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("thermistor resistance out of range ({ohms} ohms)")]
    ResistanceOutOfRange { ohms: f64 },
    #[error("calibration polynomial produced a non-finite temperature")]
    NonFiniteReading,
    #[error("analog read failed: {0}")]
    Analog(String),
}

#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
