use crate::control::HeaterMode;

/// The shared mutable record threaded through every poll cycle.
///
/// Replaces the module-level globals of earlier firmware variants: the
/// setpoint and enable flag are mutated only by button dispatch, the
/// mode only by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Target temperature (Celsius); unclamped by design
    pub setpoint_c: f64,
    /// Hysteresis half-width (Celsius); constant at runtime
    pub tolerance_c: f64,
    /// Master on/off; false forces `Idle` regardless of temperature
    pub enabled: bool,
    pub mode: HeaterMode,
}

impl ControllerState {
    pub fn new(setpoint_c: f64, tolerance_c: f64) -> Self {
        Self {
            setpoint_c,
            tolerance_c,
            enabled: false,
            mode: HeaterMode::Idle,
        }
    }
}
