pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One raw touch-panel reading, pre-calibration.
///
/// Coordinates are in panel units, not pixels; `pressure` is the raw
/// z-axis value. Whether a sample counts as an actual touch is decided
/// by the consumer's pressure thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTouch {
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
}

/// ADC channel reader. Returns a raw count in `[0, 2^resolution - 1]`.
pub trait AnalogInput {
    fn read(&mut self, channel: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Binary heater actuator (relay or SSR drive pin).
pub trait HeaterOutput {
    fn set_on(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Resistive touch panel sampler.
///
/// Implementations that share signal lines with the display must
/// restore those lines to the display's expected mode before
/// returning, on every exit path.
pub trait TouchPanel {
    fn sample(&mut self) -> Result<RawTouch, Box<dyn std::error::Error + Send + Sync>>;
}

/// Display collaborator. `init` is called once at startup and may fail
/// on an unrecognized controller; `update` overwrites a fixed status
/// region idempotently every poll.
pub trait Display {
    fn init(
        &mut self,
        temperature_c: f64,
        setpoint_c: f64,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn update(
        &mut self,
        temperature_c: f64,
        setpoint_c: f64,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Redraw a button face in its pressed or resting appearance.
    fn draw_button(
        &mut self,
        label: &str,
        pressed: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
